//! Bounded windows over a waveform series and selection-to-index mapping.

use super::{Sample, WaveformSeries};
use crate::utils::{AnnError, Result};

pub const DEFAULT_WINDOW_WIDTH: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Window<'a> {
    Samples { samples: &'a [Sample], has_more: bool },
    /// Nothing left to page through from the requested position.
    Exhausted,
}

impl<'a> Window<'a> {
    pub fn samples(&self) -> &'a [Sample] {
        match self {
            Window::Samples { samples, .. } => samples,
            Window::Exhausted => &[],
        }
    }

    pub fn has_more(&self) -> bool {
        matches!(self, Window::Samples { has_more: true, .. })
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Window::Exhausted)
    }
}

/// Window of up to `width` samples starting at `from_index`, truncated at the series end.
pub fn next_window(series: &WaveformSeries, from_index: usize, width: usize) -> Window<'_> {
    let samples = series.samples();
    if from_index >= samples.len() {
        return Window::Exhausted;
    }
    let end = from_index.saturating_add(width.max(1)).min(samples.len());
    Window::Samples {
        samples: &samples[from_index..end],
        has_more: end < samples.len(),
    }
}

/// Pages through a series window by window.
pub struct Windows<'a> {
    series: &'a WaveformSeries,
    cursor: usize,
    width: usize,
}

impl<'a> Windows<'a> {
    pub fn new(series: &'a WaveformSeries, width: usize) -> Self {
        Self {
            series,
            cursor: 0,
            width,
        }
    }
}

impl<'a> Iterator for Windows<'a> {
    type Item = &'a [Sample];

    fn next(&mut self) -> Option<Self::Item> {
        let window = next_window(self.series, self.cursor, self.width);
        let samples = window.samples();
        self.cursor += samples.len();
        (!window.is_exhausted()).then_some(samples)
    }
}

/// First and last sample index with `start_ms < timestamp <= end_ms`.
pub fn map_time_range_to_indices(
    series: &WaveformSeries,
    start_ms: i64,
    end_ms: i64,
) -> Result<(usize, usize)> {
    select_in(series.samples(), start_ms, end_ms)
}

/// Same as [`map_time_range_to_indices`] restricted to a window.
fn select_in(samples: &[Sample], start_ms: i64, end_ms: i64) -> Result<(usize, usize)> {
    let first = samples.partition_point(|s| s.timestamp_ms <= start_ms);
    let last_exclusive = samples.partition_point(|s| s.timestamp_ms <= end_ms);
    if first >= last_exclusive {
        return Err(AnnError::EmptySelection { start_ms, end_ms });
    }
    Ok((samples[first].index, samples[last_exclusive - 1].index))
}

/// Maps several `(start_ms, end_ms]` selections in a single pass over chunks.
///
/// Returns the number of samples read and one index pair per range. Timestamps
/// never decrease, so a range's samples are contiguous across chunk edges.
pub fn map_time_ranges_in_chunks<I>(
    chunks: I,
    ranges: &[(i64, i64)],
) -> Result<(usize, Vec<Result<(usize, usize)>>)>
where
    I: IntoIterator<Item = Result<Vec<Sample>>>,
{
    let mut found: Vec<Option<(usize, usize)>> = vec![None; ranges.len()];
    let mut len = 0;
    for chunk in chunks {
        let chunk = chunk?;
        for (&(start_ms, end_ms), hit) in ranges.iter().zip(found.iter_mut()) {
            if let Ok((first, last)) = select_in(&chunk, start_ms, end_ms) {
                *hit = Some((hit.map_or(first, |(start, _)| start), last));
            }
        }
        len += chunk.len();
    }
    let mapped = found
        .into_iter()
        .zip(ranges)
        .map(|(hit, &(start_ms, end_ms))| hit.ok_or(AnnError::EmptySelection { start_ms, end_ms }))
        .collect();
    Ok((len, mapped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(len: usize) -> WaveformSeries {
        let amplitudes: Vec<f64> = (0..len).map(|i| i as f64).collect();
        WaveformSeries::from_amplitudes("rec", 0, 100, &amplitudes)
    }

    #[test]
    fn test_windows_cover_series_exactly() {
        for (len, width) in [(100, 30), (90, 30), (1, 5), (7, 1)] {
            let series = series(len);
            let mut from = 0;
            let mut windows = Vec::new();
            loop {
                match next_window(&series, from, width) {
                    Window::Samples { samples, has_more } => {
                        windows.push(samples.to_vec());
                        from += samples.len();
                        if !has_more {
                            break;
                        }
                    }
                    Window::Exhausted => panic!("exhausted before has_more=false"),
                }
            }
            assert_eq!(windows.len(), len.div_ceil(width));
            let concatenated: Vec<Sample> = windows.into_iter().flatten().collect();
            assert_eq!(concatenated, series.samples());
            assert!(next_window(&series, from, width).is_exhausted());
        }
    }

    #[test]
    fn test_window_truncated_at_end() {
        let series = series(50);
        let window = next_window(&series, 40, 20);
        assert_eq!(window.samples().len(), 10);
        assert!(!window.has_more());
        assert!(next_window(&series, 30, 10).has_more());
        assert!(!next_window(&series, 40, 10).has_more());
    }

    #[test]
    fn test_window_past_end_is_exhausted() {
        let series = series(10);
        assert_eq!(next_window(&series, 10, 5), Window::Exhausted);
        assert_eq!(next_window(&series, 500, 5), Window::Exhausted);
        assert!(next_window(&WaveformSeries::from_amplitudes("e", 0, 1, &[]), 0, 5).is_exhausted());
    }

    #[test]
    fn test_windows_iterator() {
        let series = series(45);
        let lengths: Vec<usize> = Windows::new(&series, 20).map(|w| w.len()).collect();
        assert_eq!(lengths, vec![20, 20, 5]);
    }

    #[test]
    fn test_selection_maps_to_indices() {
        // Timestamps 0, 10, ..., 990.
        let series = series(100);
        let (start, end) = map_time_range_to_indices(&series, 205, 405).unwrap();
        assert_eq!((start, end), (21, 40));
        assert_eq!(series.samples()[start].timestamp_ms, 210);
        assert_eq!(series.samples()[end].timestamp_ms, 400);

        // Lower bound is exclusive, upper bound inclusive.
        assert_eq!(map_time_range_to_indices(&series, 200, 400).unwrap(), (21, 40));
    }

    #[test]
    fn test_collapsed_or_inverted_selection_is_empty() {
        let series = series(100);
        assert!(matches!(
            map_time_range_to_indices(&series, 300, 300),
            Err(AnnError::EmptySelection {
                start_ms: 300,
                end_ms: 300
            })
        ));
        assert!(map_time_range_to_indices(&series, 400, 200).is_err());
        assert!(map_time_range_to_indices(&series, 990, 5000).is_err());
    }

    #[test]
    fn test_select_in_window_reports_series_indices() {
        let series = series(100);
        let window = next_window(&series, 40, 20).samples();
        assert_eq!(select_in(window, 400, 450).unwrap(), (41, 45));
    }

    #[test]
    fn test_ranges_in_chunks_match_whole_series() {
        let series = series(100);
        let chunks = series.samples().chunks(7).map(|chunk| Ok(chunk.to_vec()));
        let ranges = [(205, 405), (0, 150), (300, 300), (990, 5000), (60, 75)];
        let (len, mapped) = map_time_ranges_in_chunks(chunks, &ranges).unwrap();
        assert_eq!(len, 100);
        for (&(start_ms, end_ms), result) in ranges.iter().zip(mapped) {
            match map_time_range_to_indices(&series, start_ms, end_ms) {
                Ok(expected) => assert_eq!(result.unwrap(), expected),
                Err(_) => assert!(matches!(result, Err(AnnError::EmptySelection { .. }))),
            }
        }
    }

    #[test]
    fn test_ranges_in_chunks_stop_at_read_error() {
        let chunks = vec![
            Ok(series(5).samples().to_vec()),
            Err(AnnError::InvalidInput("bad row".to_string())),
        ];
        assert!(map_time_ranges_in_chunks(chunks, &[(0, 10)]).is_err());
    }
}
