pub mod catalog;
pub mod format;
pub mod reader;
pub mod writer;

pub use catalog::{
    annotation_path, is_annotated, list_recordings, paired_recordings, RecordingEntry,
};
pub use format::{recording_name, ANNOTATION_KEY, STORE_EXTENSION, WAVEFORMS_KEY};
pub use reader::{
    load_waveform, read_annotations, read_series, require_annotations, stream_series,
    LoadedWaveform, SampleRows,
};
pub use writer::{write_annotations, write_recording};
