use crate::annotation::{intervals, AnnotationSequence, Run};
use crate::cli::InspectArgs;
use crate::store::{load_waveform, read_annotations, recording_name, LoadedWaveform};
use crate::utils::{AnnError, Result};
use crate::waveform::{format_timestamp, Sample, Windows};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// What a single pass over a recording learns about it.
#[derive(Debug, Default, PartialEq)]
pub struct RecordingSummary {
    pub samples: usize,
    pub windows: usize,
    pub disconnected: usize,
    pub span_ms: Option<(i64, i64)>,
    /// Timestamps of the samples on either side of each boundary.
    boundary_times: BTreeMap<usize, i64>,
}

impl RecordingSummary {
    fn tracking(seq: Option<&AnnotationSequence>) -> Self {
        let mut boundary_times = BTreeMap::new();
        for boundary in seq.map(|seq| seq.boundaries()).unwrap_or_default() {
            boundary_times.insert(boundary.index, i64::MIN);
            if let Some(previous) = boundary.index.checked_sub(1) {
                boundary_times.insert(previous, i64::MIN);
            }
        }
        Self {
            boundary_times,
            ..Self::default()
        }
    }

    fn observe(&mut self, window: &[Sample]) {
        let (Some(first), Some(last)) = (window.first(), window.last()) else {
            return;
        };
        self.windows += 1;
        self.samples += window.len();
        self.disconnected += window.iter().filter(|s| s.is_disconnected()).count();
        self.span_ms = Some(match self.span_ms {
            Some((start, _)) => (start, last.timestamp_ms),
            None => (first.timestamp_ms, last.timestamp_ms),
        });
        for (index, time) in self.boundary_times.range_mut(first.index..=last.index) {
            *time = window[index - first.index].timestamp_ms;
        }
    }

    /// Time of a sample whose index was tracked or is the last one.
    fn time_of(&self, index: usize) -> Option<i64> {
        match self.boundary_times.get(&index) {
            Some(&time) if time != i64::MIN => Some(time),
            _ if index + 1 == self.samples => self.span_ms.map(|(_, end)| end),
            _ => None,
        }
    }
}

pub fn inspect(args: InspectArgs) -> Result<()> {
    let name = recording_name(&args.recording_path).unwrap_or_default();
    let annotations = match &args.annotation_path {
        Some(path) => {
            let seq = read_annotations(path)?;
            if seq.is_none() {
                log::warn!("{} holds no annotations", path.display());
            }
            seq
        }
        None => None,
    };

    let mut summary = RecordingSummary::tracking(annotations.as_ref());
    match load_waveform(&args.recording_path, args.max_samples, args.chunk_size)? {
        LoadedWaveform::Series(series) => {
            for window in Windows::new(&series, args.window_width) {
                summary.observe(window);
            }
        }
        LoadedWaveform::Chunked(chunks) => {
            for chunk in chunks {
                summary.observe(&chunk?);
            }
        }
    }

    let runs = annotations
        .as_ref()
        .map(|seq| intervals(seq, Some(summary.samples)))
        .unwrap_or_default();
    let stdout = io::stdout();
    write_report(&mut stdout.lock(), &name, &summary, &runs)
        .map_err(|e| AnnError::io("<stdout>", e))
}

fn write_report(
    out: &mut impl Write,
    name: &str,
    summary: &RecordingSummary,
    runs: &[Run],
) -> io::Result<()> {
    let time = |ms: Option<i64>| ms.map(format_timestamp).unwrap_or_else(|| "NA".to_string());
    writeln!(out, "recording\t{}", name)?;
    writeln!(out, "samples\t{}", summary.samples)?;
    writeln!(out, "windows\t{}", summary.windows)?;
    writeln!(out, "disconnected\t{}", summary.disconnected)?;
    writeln!(out, "start\t{}", time(summary.span_ms.map(|(start, _)| start)))?;
    writeln!(out, "end\t{}", time(summary.span_ms.map(|(_, end)| end)))?;
    if runs.is_empty() {
        return Ok(());
    }
    writeln!(out, "label\tstart\tend\tstart_time\tend_time")?;
    for run in runs {
        let last = run.end.bounded().and_then(|end| end.checked_sub(1));
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            run.label.token(),
            run.start,
            run.end,
            time(summary.time_of(run.start)),
            time(last.and_then(|index| summary.time_of(index)))
        )?;
    }
    Ok(())
}
