//! Interval agreement between two independently boundaried annotation sequences.

use super::{codec::runs_with_label, AnnotationSequence, Label, Run, RunEnd};
use itertools::iproduct;
use std::fmt;

/// Inclusive index range `[start, end]`; an open end extends past every index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClosedRange {
    pub start: usize,
    pub end: RunEnd,
}

impl ClosedRange {
    pub fn new(start: usize, end: RunEnd) -> Self {
        Self { start, end }
    }

    pub fn from_run(run: &Run) -> Self {
        let end = match run.end {
            RunEnd::Bounded(end) => RunEnd::Bounded(end - 1),
            RunEnd::Open => RunEnd::Open,
        };
        Self::new(run.start, end)
    }

    pub fn intersects(&self, other: &ClosedRange) -> bool {
        RunEnd::Bounded(self.start.max(other.start)) <= self.end.min(other.end)
    }
}

impl fmt::Display for ClosedRange {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "[{},{}]", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchedPair {
    pub a: ClosedRange,
    pub b: ClosedRange,
}

impl MatchedPair {
    pub fn overlap(&self) -> ClosedRange {
        ClosedRange::new(self.a.start.max(self.b.start), self.a.end.min(self.b.end))
    }

    pub fn swapped(&self) -> MatchedPair {
        MatchedPair {
            a: self.b,
            b: self.a,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub matched: Vec<MatchedPair>,
    pub unmatched_a: Vec<ClosedRange>,
    pub unmatched_b: Vec<ClosedRange>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSummary {
    pub pairs: usize,
    pub matched_a: usize,
    pub unmatched_a: usize,
    pub matched_b: usize,
    pub unmatched_b: usize,
}

impl MatchResult {
    pub fn summary(&self) -> MatchSummary {
        let distinct = |side: fn(&MatchedPair) -> ClosedRange| {
            let mut ranges: Vec<ClosedRange> = self.matched.iter().map(side).collect();
            ranges.sort_by_key(|range| (range.start, range.end));
            ranges.dedup();
            ranges.len()
        };
        MatchSummary {
            pairs: self.matched.len(),
            matched_a: distinct(|pair| pair.a),
            unmatched_a: self.unmatched_a.len(),
            matched_b: distinct(|pair| pair.b),
            unmatched_b: self.unmatched_b.len(),
        }
    }
}

/// Closed ranges of every run labelled `label`; the final run stays open-ended.
pub fn closed_ranges(seq: &AnnotationSequence, label: Label) -> Vec<ClosedRange> {
    runs_with_label(seq, label, None)
        .iter()
        .map(ClosedRange::from_run)
        .collect()
}

/// Pairs every intersecting `label` range of `a` with those of `b`.
///
/// A range that intersects anything on the other side is matched, however
/// many partners it has; everything else is reported as unmatched.
/// Pairwise, `O(|a| * |b|)` in the number of `label` runs.
pub fn compare(a: &AnnotationSequence, b: &AnnotationSequence, label: Label) -> MatchResult {
    let ranges_a = closed_ranges(a, label);
    let ranges_b = closed_ranges(b, label);

    let mut is_matched_a = vec![false; ranges_a.len()];
    let mut is_matched_b = vec![false; ranges_b.len()];
    let mut matched = Vec::new();

    for ((i, range_a), (j, range_b)) in
        iproduct!(ranges_a.iter().enumerate(), ranges_b.iter().enumerate())
    {
        if range_a.intersects(range_b) {
            matched.push(MatchedPair {
                a: *range_a,
                b: *range_b,
            });
            is_matched_a[i] = true;
            is_matched_b[j] = true;
        }
    }

    let unmatched = |ranges: Vec<ClosedRange>, flags: Vec<bool>| {
        ranges
            .into_iter()
            .zip(flags)
            .filter_map(|(range, is_matched)| (!is_matched).then_some(range))
            .collect::<Vec<_>>()
    };

    log::debug!(
        "{}: {} matched pairs from {} x {} ranges",
        label,
        matched.len(),
        ranges_a.len(),
        ranges_b.len()
    );

    MatchResult {
        matched,
        unmatched_a: unmatched(ranges_a, is_matched_a),
        unmatched_b: unmatched(ranges_b, is_matched_b),
    }
}
