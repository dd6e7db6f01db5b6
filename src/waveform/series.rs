use super::Sample;
use crate::utils::{AnnError, Result};

/// Samples of one recording, indexed contiguously from zero.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformSeries {
    name: String,
    samples: Vec<Sample>,
}

impl WaveformSeries {
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> Result<Self> {
        let name = name.into();
        for (position, sample) in samples.iter().enumerate() {
            if sample.index != position {
                return Err(AnnError::InvalidInput(format!(
                    "{}: sample at position {} has index {}",
                    name, position, sample.index
                )));
            }
        }
        if let Some(pair) = samples
            .windows(2)
            .find(|pair| pair[1].timestamp_ms < pair[0].timestamp_ms)
        {
            return Err(AnnError::InvalidInput(format!(
                "{}: timestamp decreases at index {}",
                name, pair[1].index
            )));
        }
        Ok(Self { name, samples })
    }

    /// Builds a series sampled at a fixed rate starting at `start_ms`.
    pub fn from_amplitudes(
        name: impl Into<String>,
        start_ms: i64,
        sampling_rate_hz: u32,
        amplitudes: &[f64],
    ) -> Self {
        let period_ms = 1000.0 / sampling_rate_hz.max(1) as f64;
        let samples = amplitudes
            .iter()
            .enumerate()
            .map(|(index, &amplitude)| {
                let offset = (index as f64 * period_ms).round() as i64;
                Sample::new(index, start_ms + offset, amplitude)
            })
            .collect();
        Self {
            name: name.into(),
            samples,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.samples.len().checked_sub(1)
    }

    pub fn check_index(&self, index: usize) -> Result<()> {
        if index < self.samples.len() {
            Ok(())
        } else {
            Err(AnnError::IndexOutOfRange {
                index,
                len: self.samples.len(),
            })
        }
    }

    /// First and last timestamps.
    pub fn time_span(&self) -> Option<(i64, i64)> {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => Some((first.timestamp_ms, last.timestamp_ms)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_amplitudes_timestamps() {
        let series = WaveformSeries::from_amplitudes("rec", 1000, 250, &[0.0; 5]);
        let timestamps: Vec<i64> = series.samples().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(timestamps, vec![1000, 1004, 1008, 1012, 1016]);
        assert_eq!(series.last_index(), Some(4));
        assert_eq!(series.time_span(), Some((1000, 1016)));
    }

    #[test]
    fn test_new_rejects_gaps() {
        let samples = vec![Sample::new(0, 0, 0.0), Sample::new(2, 10, 0.0)];
        assert!(WaveformSeries::new("rec", samples).is_err());
    }

    #[test]
    fn test_new_rejects_decreasing_timestamps() {
        let samples = vec![Sample::new(0, 10, 0.0), Sample::new(1, 5, 0.0)];
        assert!(WaveformSeries::new("rec", samples).is_err());
    }

    #[test]
    fn test_check_index() {
        let series = WaveformSeries::from_amplitudes("rec", 0, 100, &[0.0; 3]);
        assert!(series.check_index(2).is_ok());
        assert!(matches!(
            series.check_index(3),
            Err(AnnError::IndexOutOfRange { index: 3, len: 3 })
        ));
        let empty = WaveformSeries::new("empty", Vec::new()).unwrap();
        assert_eq!(empty.last_index(), None);
        assert_eq!(empty.time_span(), None);
    }
}
