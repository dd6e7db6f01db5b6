//! Editing context for the recording currently being annotated.

use crate::annotation::{AnnotationSequence, Label};
use crate::store::{annotation_path, write_annotations};
use crate::utils::{AnnError, Result};
use crate::waveform::{map_time_range_to_indices, next_window, WaveformSeries, Window};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SessionParams {
    pub window_width: usize,
    pub output_dir: PathBuf,
}

/// Result of a flush that wrote something.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushOutcome {
    pub path: PathBuf,
    pub boundaries: usize,
    /// A previously saved annotation store was replaced.
    pub overwritten: bool,
}

/// The recording a session works on.
enum OpenRecording {
    Loaded(WaveformSeries),
    /// Too large to hold in memory: selections arrive already mapped to
    /// indices and no windows can be shown.
    Streamed { name: String, len: usize },
}

impl OpenRecording {
    fn name(&self) -> &str {
        match self {
            OpenRecording::Loaded(series) => series.name(),
            OpenRecording::Streamed { name, .. } => name,
        }
    }

    fn len(&self) -> usize {
        match self {
            OpenRecording::Loaded(series) => series.len(),
            OpenRecording::Streamed { len, .. } => *len,
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let len = self.len();
        if index < len {
            Ok(())
        } else {
            Err(AnnError::IndexOutOfRange { index, len })
        }
    }
}

/// One open recording and the boundaries labelled on it so far.
///
/// Nothing is persisted until [`AnnotationSession::flush`]; abandoning the
/// session or opening another recording drops unflushed work.
pub struct AnnotationSession {
    params: SessionParams,
    recording: Option<OpenRecording>,
    in_progress: AnnotationSequence,
    cursor: usize,
}

impl AnnotationSession {
    pub fn new(params: SessionParams) -> Self {
        Self {
            params,
            recording: None,
            in_progress: AnnotationSequence::new(),
            cursor: 0,
        }
    }

    /// Makes `series` the current recording.
    ///
    /// Returns the number of unflushed boundaries that were discarded.
    pub fn open(&mut self, series: WaveformSeries) -> usize {
        log::info!("Opened {} ({} samples)", series.name(), series.len());
        self.replace_recording(OpenRecording::Loaded(series))
    }

    /// Opens a recording read in chunks, known only by name and length.
    ///
    /// Label it with [`AnnotationSession::label_range`]; windows are unavailable.
    pub fn open_streamed(&mut self, name: impl Into<String>, len: usize) -> usize {
        let name = name.into();
        log::info!("Opened {} ({} samples, streamed)", name, len);
        self.replace_recording(OpenRecording::Streamed { name, len })
    }

    fn replace_recording(&mut self, recording: OpenRecording) -> usize {
        let discarded = self.in_progress.len();
        if discarded > 0 {
            log::warn!(
                "Discarding {} unsaved boundaries for {}",
                discarded,
                self.recording
                    .as_ref()
                    .map(|open| open.name())
                    .unwrap_or_default()
            );
        }
        self.in_progress.clear();
        self.cursor = 0;
        self.recording = Some(recording);
        discarded
    }

    /// The open recording when it is held in memory.
    pub fn recording(&self) -> Option<&WaveformSeries> {
        match self.recording.as_ref()? {
            OpenRecording::Loaded(series) => Some(series),
            OpenRecording::Streamed { .. } => None,
        }
    }

    pub fn in_progress(&self) -> &AnnotationSequence {
        &self.in_progress
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.in_progress.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn annotation_path(&self) -> Result<PathBuf> {
        let open = self.open_recording()?;
        Ok(annotation_path(&self.params.output_dir, open.name()))
    }

    /// Whether an annotation store already exists for the open recording.
    pub fn is_annotated(&self) -> Result<bool> {
        Ok(self.annotation_path()?.is_file())
    }

    pub fn current_window(&self) -> Result<Window<'_>> {
        let series = self.series()?;
        Ok(next_window(series, self.cursor, self.params.window_width))
    }

    /// Jumps to the window starting at `index`.
    pub fn seek(&mut self, index: usize) -> Result<()> {
        self.open_recording()?.check_index(index)?;
        self.cursor = index;
        Ok(())
    }

    /// Moves to the window following the current one.
    pub fn advance(&mut self) -> Result<Window<'_>> {
        let len = self.series()?.len();
        self.cursor = self
            .cursor
            .saturating_add(self.params.window_width.max(1))
            .min(len);
        self.current_window()
    }

    /// Sets the label in force from `start_index`, returning the label it replaced.
    pub fn label(&mut self, start_index: usize, label: Label) -> Result<Option<Label>> {
        self.open_recording()?.check_index(start_index)?;
        Ok(self.in_progress.upsert(start_index, label))
    }

    /// Labels the samples between two selection handles.
    ///
    /// The boundary goes on the first selected sample and the cursor moves to
    /// the last one, so the next window starts where this selection ended.
    pub fn label_selection(
        &mut self,
        label: Label,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<(usize, usize)> {
        let (start, end) = map_time_range_to_indices(self.series()?, start_ms, end_ms)?;
        self.label_range(label, start, end)
    }

    /// Labels the already mapped samples `start..=end`, moving the cursor to `end`.
    pub fn label_range(
        &mut self,
        label: Label,
        start: usize,
        end: usize,
    ) -> Result<(usize, usize)> {
        let open = self.open_recording()?;
        open.check_index(start)?;
        open.check_index(end)?;
        if end < start {
            return Err(AnnError::InvalidInput(format!(
                "Selection end {} precedes its start {}",
                end, start
            )));
        }
        self.in_progress.upsert(start, label);
        self.cursor = end;
        log::debug!("Labelled {} at {} (selection ends at {})", label, start, end);
        Ok((start, end))
    }

    /// True once the cursor sits on the last sample: the selection predicate
    /// excludes a window's first sample, so nothing is left to select.
    pub fn is_finished(&self) -> bool {
        match &self.recording {
            Some(open) => open
                .len()
                .checked_sub(1)
                .map_or(true, |last| self.cursor >= last),
            None => false,
        }
    }

    /// Persists the compacted in-progress sequence and clears it.
    ///
    /// Returns `None` without touching disk when there is nothing to save. A
    /// failed write keeps the in-progress sequence so the flush can be retried.
    pub fn flush(&mut self) -> Result<Option<FlushOutcome>> {
        if self.in_progress.is_empty() {
            return Ok(None);
        }
        let path = self.annotation_path()?;
        let overwritten = path.is_file();
        let compacted = self.in_progress.compact();
        write_annotations(&path, &compacted)?;

        if overwritten {
            log::warn!("Overwrote previous annotations in {}", path.display());
        }
        log::info!(
            "Saved {} boundaries to {}",
            compacted.len(),
            path.display()
        );
        self.in_progress.clear();
        Ok(Some(FlushOutcome {
            path,
            boundaries: compacted.len(),
            overwritten,
        }))
    }

    fn open_recording(&self) -> Result<&OpenRecording> {
        self.recording.as_ref().ok_or(AnnError::NoRecordingOpen)
    }

    fn series(&self) -> Result<&WaveformSeries> {
        match self.open_recording()? {
            OpenRecording::Loaded(series) => Ok(series),
            OpenRecording::Streamed { name, .. } => Err(AnnError::InvalidInput(format!(
                "{} is read in chunks; raise --max-samples to page through its windows",
                name
            ))),
        }
    }
}
