//! Run-length encoding between per-sample labels and boundary sequences.

use super::{AnnotationSequence, Boundary, Label, Run, RunEnd};
use crate::utils::{AnnError, Result};

/// Collapses an ascending `(index, label)` stream into one boundary per run.
///
/// Gaps between indices do not produce boundaries; a run simply continues
/// across them. The stream must be strictly ascending by index.
pub fn encode<I>(labels_by_index: I) -> Result<AnnotationSequence>
where
    I: IntoIterator<Item = (usize, Label)>,
{
    let mut boundaries: Vec<Boundary> = Vec::new();
    let mut previous: Option<(usize, Label)> = None;
    for (index, label) in labels_by_index {
        if let Some((previous_index, previous_label)) = previous {
            if index <= previous_index {
                return Err(AnnError::UnorderedStream {
                    previous: previous_index,
                    index,
                });
            }
            if label == previous_label {
                previous = Some((index, label));
                continue;
            }
        }
        boundaries.push(Boundary::new(index, label));
        previous = Some((index, label));
    }
    Ok(AnnotationSequence::from_sorted_unchecked(boundaries))
}

/// Label in force at `index`: the one of the greatest boundary `<= index`.
pub fn decode(seq: &AnnotationSequence, index: usize) -> Result<Label> {
    let boundaries = seq.boundaries();
    match boundaries.partition_point(|b| b.index <= index) {
        0 => Err(AnnError::IndexBeforeFirstBoundary { index }),
        pos => Ok(boundaries[pos - 1].label),
    }
}

/// Materialises every run as `[start, end)`.
///
/// Without a `series_len` the final run is open-ended. With one, the final
/// run ends at `series_len` and runs starting at or past it are dropped.
pub fn intervals(seq: &AnnotationSequence, series_len: Option<usize>) -> Vec<Run> {
    let boundaries = seq.boundaries();
    boundaries
        .iter()
        .enumerate()
        .filter(|(_, boundary)| series_len.map_or(true, |len| boundary.index < len))
        .map(|(i, boundary)| {
            let end = match (boundaries.get(i + 1), series_len) {
                (Some(next), Some(len)) => RunEnd::Bounded(next.index.min(len)),
                (Some(next), None) => RunEnd::Bounded(next.index),
                (None, Some(len)) => RunEnd::Bounded(len),
                (None, None) => RunEnd::Open,
            };
            Run {
                label: boundary.label,
                start: boundary.index,
                end,
            }
        })
        .collect()
}

/// Runs carrying `label`, in index order.
pub fn runs_with_label(
    seq: &AnnotationSequence,
    label: Label,
    series_len: Option<usize>,
) -> Vec<Run> {
    intervals(seq, series_len)
        .into_iter()
        .filter(|run| run.label == label)
        .collect()
}
