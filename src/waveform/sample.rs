use chrono::{DateTime, Utc};

/// Amplitudes at or below this value are bedside-monitor disconnects.
pub const DISCONNECTED_THRESHOLD: f64 = -79.0;

/// Amplitude stored in place of missing readings.
pub const NO_SIGNAL_FILL: f64 = -128.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub index: usize,
    pub timestamp_ms: i64,
    pub amplitude: f64,
}

impl Sample {
    pub fn new(index: usize, timestamp_ms: i64, amplitude: f64) -> Self {
        Self {
            index,
            timestamp_ms,
            amplitude,
        }
    }

    pub fn is_disconnected(&self) -> bool {
        self.amplitude.is_nan() || self.amplitude <= DISCONNECTED_THRESHOLD
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }
}

/// Formats a millisecond timestamp for logs and reports.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(datetime) => datetime.format("%d-%m-%Y %H:%M:%S%.3f").to_string(),
        None => format!("{}ms", timestamp_ms),
    }
}
