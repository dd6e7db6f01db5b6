use super::color::{label_color, Color};
use crate::annotation::{compare, decode, AnnotationSequence, Label, RunEnd};
use crate::utils::{AnnError, Result};
use crate::waveform::{Sample, WaveformSeries};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use trackplot::{Axis, Legend, Seg, Trace, TracePoint, Track, TrackPlot};

pub const DEFAULT_PLOT_COLUMNS: usize = 2000;

const TRACE_HEIGHT: u32 = 60;
const TRACK_HEIGHT: u32 = 5;
const TRACK_SPACING: u32 = 10;
const LEGEND_HEIGHT: u32 = 5;

#[derive(Debug, Clone)]
pub struct PlotParams {
    /// Trace resolution; each column summarises a bucket of samples.
    pub columns: usize,
    /// Label whose matched overlaps are highlighted when two layers are plotted.
    pub target: Label,
    pub ticks: usize,
}

impl Default for PlotParams {
    fn default() -> Self {
        Self {
            columns: DEFAULT_PLOT_COLUMNS,
            target: Label::AF,
            ticks: 6,
        }
    }
}

/// A named annotation sequence drawn as one track.
#[derive(Debug, Clone)]
pub struct AnnotationLayer {
    pub name: String,
    pub seq: AnnotationSequence,
}

/// Sample range `[start, end)` summarised by each column.
fn buckets(len: usize, columns: usize) -> Vec<(usize, usize)> {
    let columns = columns.min(len).max(1);
    (0..columns)
        .map(|c| (c * len / columns, (c + 1) * len / columns))
        .filter(|(start, end)| start < end)
        .collect()
}

/// What one trace column shows of its bucket of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Column {
    start: usize,
    end: usize,
    start_time: Option<DateTime<Utc>>,
    /// Largest deviation in the bucket ignoring disconnected samples; NaN if none.
    peak: f64,
}

/// Folds samples, in index order, into per-column summaries.
struct ColumnBuilder {
    buckets: Vec<(usize, usize)>,
    columns: Vec<Column>,
}

impl ColumnBuilder {
    fn new(len: usize, columns: usize) -> Self {
        let buckets = buckets(len, columns);
        Self {
            columns: Vec::with_capacity(buckets.len()),
            buckets,
        }
    }

    fn extend(&mut self, samples: &[Sample]) {
        for sample in samples {
            let opens_bucket = self
                .buckets
                .get(self.columns.len())
                .is_some_and(|&(start, _)| start == sample.index);
            if opens_bucket {
                let (start, end) = self.buckets[self.columns.len()];
                self.columns.push(Column {
                    start,
                    end,
                    start_time: sample.timestamp(),
                    peak: f64::NAN,
                });
            }
            let Some(column) = self.columns.last_mut() else {
                continue;
            };
            if !sample.is_disconnected()
                && (column.peak.is_nan() || sample.amplitude.abs() > column.peak.abs())
            {
                column.peak = sample.amplitude;
            }
        }
    }

    fn finish(self, name: &str) -> Result<Vec<Column>> {
        if self.columns.len() != self.buckets.len() {
            return Err(AnnError::InvalidInput(format!(
                "Recording {} ended before column {} of {}",
                name,
                self.columns.len() + 1,
                self.buckets.len()
            )));
        }
        Ok(self.columns)
    }
}

/// Builds the annotated view of a recording.
///
/// The trace is colored by the first layer; every layer gets its own track
/// and two layers add a track marking where their `target` runs overlap.
pub fn plot_recording(
    series: &WaveformSeries,
    layers: &[AnnotationLayer],
    params: &PlotParams,
) -> Result<TrackPlot> {
    check_not_empty(series.name(), series.len())?;
    let mut builder = ColumnBuilder::new(series.len(), params.columns);
    builder.extend(series.samples());
    let columns = builder.finish(series.name())?;
    plot_columns(series.name(), series.len(), &columns, layers, params)
}

/// Same view as [`plot_recording`] for a recording read in chunks.
///
/// `len` is the total number of samples the chunks will yield.
pub fn plot_chunks<I>(
    name: &str,
    len: usize,
    chunks: I,
    layers: &[AnnotationLayer],
    params: &PlotParams,
) -> Result<TrackPlot>
where
    I: IntoIterator<Item = Result<Vec<Sample>>>,
{
    check_not_empty(name, len)?;
    let mut builder = ColumnBuilder::new(len, params.columns);
    for chunk in chunks {
        builder.extend(&chunk?);
    }
    let columns = builder.finish(name)?;
    plot_columns(name, len, &columns, layers, params)
}

fn check_not_empty(name: &str, len: usize) -> Result<()> {
    if len == 0 {
        return Err(AnnError::InvalidInput(format!(
            "Recording {} has no samples to plot",
            name
        )));
    }
    Ok(())
}

fn plot_columns(
    name: &str,
    len: usize,
    columns: &[Column],
    layers: &[AnnotationLayer],
    params: &PlotParams,
) -> Result<TrackPlot> {
    let first = layers.first().map(|layer| &layer.seq);

    let trace = Trace {
        xpos: 0,
        ypos: 0,
        height: TRACE_HEIGHT,
        points: columns
            .iter()
            .map(|column| TracePoint {
                value: column.peak,
                color: column_color(first, column.start).to_string(),
            })
            .collect(),
    };

    let mut ypos = TRACE_HEIGHT + TRACK_SPACING;
    let mut tracks = Vec::new();
    for layer in layers {
        let colors = columns
            .iter()
            .map(|column| column_color(Some(&layer.seq), column.start));
        tracks.push(track(ypos, layer.name.clone(), run_segs(colors)));
        ypos += TRACK_SPACING;
    }

    let mut legend_labels: Vec<(String, String)> = Label::ALL
        .into_iter()
        .map(|label| (label.token().to_string(), label_color(label).to_string()))
        .collect();

    if let [a, b] = layers {
        let result = compare(&a.seq, &b.seq, params.target);
        let last = len - 1;
        let overlaps: Vec<(usize, usize)> = result
            .matched
            .iter()
            .map(|pair| {
                let range = pair.overlap();
                let end = match range.end {
                    RunEnd::Bounded(end) => end.min(last),
                    RunEnd::Open => last,
                };
                (range.start, end)
            })
            .collect();
        let colors = columns.iter().map(|column| {
            let hit = overlaps
                .iter()
                .any(|&(s, e)| s < column.end && column.start <= e);
            if hit {
                Color::Orange
            } else {
                Color::LightGray
            }
        });
        log::debug!(
            "{} matched {} ranges between {} and {}",
            result.matched.len(),
            params.target,
            a.name,
            b.name
        );
        tracks.push(track(
            ypos,
            format!("{} overlap", params.target),
            run_segs(colors),
        ));
        legend_labels.push(("overlap".to_string(), Color::Orange.to_string()));
        ypos += TRACK_SPACING;
    }

    let axis = Axis {
        xpos: 0,
        ypos,
        ticks: time_ticks(columns, params.ticks),
    };

    Ok(TrackPlot {
        title: Some(name.to_string()),
        traces: vec![trace],
        tracks,
        axis: Some(axis),
        legend: Legend {
            xpos: 0,
            ypos: ypos + TRACK_SPACING,
            height: LEGEND_HEIGHT,
            labels: legend_labels,
        },
    })
}

fn track(ypos: u32, title: String, segs: Vec<Seg>) -> Track {
    Track {
        xpos: 0,
        ypos,
        height: TRACK_HEIGHT,
        title: Some(title),
        segs,
        outline: true,
    }
}

fn column_color(seq: Option<&AnnotationSequence>, index: usize) -> Color {
    seq.and_then(|seq| decode(seq, index).ok())
        .map_or(Color::LightGray, label_color)
}

fn run_segs(colors: impl Iterator<Item = Color>) -> Vec<Seg> {
    colors
        .dedup_with_count()
        .map(|(width, color)| Seg {
            width: width as u32,
            color: color.to_string(),
        })
        .collect()
}

fn time_ticks(columns: &[Column], ticks: usize) -> Vec<(u32, String)> {
    if ticks == 0 {
        return Vec::new();
    }
    let step = columns.len().div_ceil(ticks).max(1);
    columns
        .iter()
        .enumerate()
        .step_by(step)
        .filter_map(|(position, column)| {
            let time = column.start_time?;
            Some((position as u32, time.format("%H:%M:%S").to_string()))
        })
        .collect()
}
