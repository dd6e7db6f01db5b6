mod chunks;
pub mod navigator;
mod sample;
mod series;

pub use chunks::{SampleChunks, DEFAULT_CHUNK_SIZE};
pub use navigator::{
    map_time_range_to_indices, map_time_ranges_in_chunks, next_window, Window, Windows,
    DEFAULT_WINDOW_WIDTH,
};
pub use sample::{format_timestamp, Sample, DISCONNECTED_THRESHOLD, NO_SIGNAL_FILL};
pub use series::WaveformSeries;
