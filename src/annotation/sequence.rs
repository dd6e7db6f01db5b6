use super::Label;
use crate::utils::{AnnError, Result};
use itertools::Itertools;
use std::fmt;

/// The label in force from `index` up to the next boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub index: usize,
    pub label: Label,
}

impl Boundary {
    pub fn new(index: usize, label: Label) -> Self {
        Self { index, label }
    }
}

/// End of a labelled run. `Open` compares greater than every bounded end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RunEnd {
    Bounded(usize),
    Open,
}

impl RunEnd {
    pub fn bounded(&self) -> Option<usize> {
        match self {
            RunEnd::Bounded(end) => Some(*end),
            RunEnd::Open => None,
        }
    }
}

impl fmt::Display for RunEnd {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunEnd::Bounded(end) => write!(formatter, "{}", end),
            RunEnd::Open => write!(formatter, "open"),
        }
    }
}

/// A materialised run `[start, end)` carrying a single label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub label: Label,
    pub start: usize,
    pub end: RunEnd,
}

impl Run {
    /// Number of samples in the run, `None` for an open-ended run.
    pub fn len(&self) -> Option<usize> {
        self.end.bounded().map(|end| end - self.start)
    }
}

/// Boundaries sorted strictly ascending by index, without duplicate indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSequence {
    boundaries: Vec<Boundary>,
}

impl AnnotationSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a sequence from boundaries that must already be strictly ascending.
    pub fn from_boundaries<I>(boundaries: I) -> Result<Self>
    where
        I: IntoIterator<Item = Boundary>,
    {
        let boundaries: Vec<Boundary> = boundaries.into_iter().collect();
        if let Some((previous, next)) = boundaries
            .iter()
            .tuple_windows()
            .find(|(previous, next)| next.index <= previous.index)
        {
            return Err(AnnError::UnorderedStream {
                previous: previous.index,
                index: next.index,
            });
        }
        Ok(Self { boundaries })
    }

    pub(crate) fn from_sorted_unchecked(boundaries: Vec<Boundary>) -> Self {
        debug_assert!(boundaries.windows(2).all(|w| w[0].index < w[1].index));
        Self { boundaries }
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Sets the boundary at `index`, returning the label it replaced.
    pub fn upsert(&mut self, index: usize, label: Label) -> Option<Label> {
        match self.boundaries.binary_search_by_key(&index, |b| b.index) {
            Ok(pos) => Some(std::mem::replace(&mut self.boundaries[pos].label, label)),
            Err(pos) => {
                self.boundaries.insert(pos, Boundary::new(index, label));
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.boundaries.clear();
    }

    /// Drops boundaries that repeat the label already in force.
    pub fn compact(&self) -> AnnotationSequence {
        let boundaries = self
            .boundaries
            .iter()
            .copied()
            .dedup_by(|previous, next| previous.label == next.label)
            .collect();
        AnnotationSequence { boundaries }
    }

    pub fn is_compact(&self) -> bool {
        self.boundaries
            .iter()
            .tuple_windows()
            .all(|(previous, next)| previous.label != next.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(entries: &[(usize, Label)]) -> AnnotationSequence {
        AnnotationSequence::from_boundaries(entries.iter().map(|&(i, l)| Boundary::new(i, l)))
            .unwrap()
    }

    #[test]
    fn test_open_end_orders_after_bounded() {
        assert!(RunEnd::Open > RunEnd::Bounded(usize::MAX));
        assert!(RunEnd::Bounded(10) < RunEnd::Bounded(11));
        assert_eq!(RunEnd::Open.bounded(), None);
    }

    #[test]
    fn test_from_boundaries_rejects_duplicates() {
        let result = AnnotationSequence::from_boundaries(vec![
            Boundary::new(0, Label::Normal),
            Boundary::new(0, Label::AF),
        ]);
        assert!(matches!(
            result,
            Err(AnnError::UnorderedStream {
                previous: 0,
                index: 0
            })
        ));
    }

    #[test]
    fn test_upsert_inserts_in_order_and_replaces() {
        let mut sequence = AnnotationSequence::new();
        assert_eq!(sequence.upsert(300, Label::Normal), None);
        assert_eq!(sequence.upsert(0, Label::Normal), None);
        assert_eq!(sequence.upsert(100, Label::Noise), None);
        assert_eq!(sequence.upsert(100, Label::AF), Some(Label::Noise));
        assert_eq!(
            sequence,
            seq(&[(0, Label::Normal), (100, Label::AF), (300, Label::Normal)])
        );
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut sequence = AnnotationSequence::new();
        sequence.upsert(50, Label::Other);
        let snapshot = sequence.clone();
        assert_eq!(sequence.upsert(50, Label::Other), Some(Label::Other));
        assert_eq!(sequence, snapshot);
    }

    #[test]
    fn test_compact_merges_repeated_labels() {
        let sequence = seq(&[
            (0, Label::Normal),
            (10, Label::Normal),
            (20, Label::AF),
            (30, Label::AF),
            (40, Label::Normal),
        ]);
        assert!(!sequence.is_compact());
        let compacted = sequence.compact();
        assert!(compacted.is_compact());
        assert_eq!(
            compacted,
            seq(&[(0, Label::Normal), (20, Label::AF), (40, Label::Normal)])
        );
    }

    #[test]
    fn test_run_len() {
        let run = Run {
            label: Label::AF,
            start: 100,
            end: RunEnd::Bounded(300),
        };
        assert_eq!(run.len(), Some(200));

        let open = Run {
            end: RunEnd::Open,
            ..run
        };
        assert_eq!(open.len(), None);
    }
}
