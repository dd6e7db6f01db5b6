use crate::annotation::Label;
use crate::cli::AnnotateArgs;
use crate::session::{AnnotationSession, SessionParams};
use crate::store::{is_annotated, load_waveform, recording_name, LoadedWaveform};
use crate::utils::{AnnError, Result};
use crate::waveform::map_time_ranges_in_chunks;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Two selection handles and the label applied between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub start_ms: i64,
    pub end_ms: i64,
    pub label: Label,
}

pub fn annotate(args: AnnotateArgs) -> Result<()> {
    let name = recording_name(&args.recording_path).ok_or_else(|| {
        AnnError::InvalidInput(format!(
            "Not a recording store: {}",
            args.recording_path.display()
        ))
    })?;
    if is_annotated(&args.output_dir, &name) && !args.force {
        return Err(AnnError::InvalidInput(format!(
            "{} is already annotated in {}; rerun with --force to replace it",
            name,
            args.output_dir.display()
        )));
    }

    let selections = read_selections(&args.selections_path)?;
    let mut session = AnnotationSession::new(SessionParams {
        window_width: args.window_width,
        output_dir: args.output_dir,
    });

    let applied = match load_waveform(&args.recording_path, args.max_samples, args.chunk_size)? {
        LoadedWaveform::Series(series) => {
            session.open(series);
            apply_selections(&mut session, &selections, |session, selection| {
                session.label_selection(selection.label, selection.start_ms, selection.end_ms)
            })?
        }
        LoadedWaveform::Chunked(chunks) => {
            let ranges: Vec<(i64, i64)> = selections
                .iter()
                .map(|selection| (selection.start_ms, selection.end_ms))
                .collect();
            let (len, mapped) = map_time_ranges_in_chunks(chunks, &ranges)?;
            session.open_streamed(name.as_str(), len);
            let mut mapped = mapped.into_iter();
            apply_selections(&mut session, &selections, |session, selection| {
                let (start, end) = mapped.next().ok_or(AnnError::EmptySelection {
                    start_ms: selection.start_ms,
                    end_ms: selection.end_ms,
                })??;
                session.label_range(selection.label, start, end)
            })?
        }
    };
    log::info!("Applied {} of {} selections", applied, selections.len());
    match session.flush()? {
        Some(outcome) => log::info!(
            "Annotated {} with {} runs in {}",
            name,
            outcome.boundaries,
            outcome.path.display()
        ),
        None => log::warn!("No selection could be applied; nothing saved for {}", name),
    }
    Ok(())
}

/// Replays selections in order, skipping those the user would have to redo.
///
/// `place` labels one selection and returns the sample indices it covered.
pub fn apply_selections<F>(
    session: &mut AnnotationSession,
    selections: &[Selection],
    mut place: F,
) -> Result<usize>
where
    F: FnMut(&mut AnnotationSession, &Selection) -> Result<(usize, usize)>,
{
    let mut applied = 0;
    for (line, selection) in selections.iter().enumerate() {
        if session.is_finished() {
            log::warn!(
                "Recording fully annotated; ignoring {} remaining selections",
                selections.len() - line
            );
            break;
        }
        match place(session, selection) {
            Ok((start, end)) => {
                log::debug!("{} on samples {}..={}", selection.label, start, end);
                applied += 1;
            }
            Err(e) if e.is_recoverable() => log::warn!("Selection {}: {}", line + 1, e),
            Err(e) => return Err(e),
        }
    }
    Ok(applied)
}

pub fn read_selections(path: &Path) -> Result<Vec<Selection>> {
    let file = File::open(path).map_err(|e| AnnError::io(path, e))?;
    parse_selections(BufReader::new(file))
        .map_err(|e| AnnError::InvalidInput(format!("{}: {}", path.display(), e)))
}

/// Parses `start_ms<TAB>end_ms<TAB>label` lines; blank and `#` lines are skipped.
fn parse_selections(reader: impl BufRead) -> std::result::Result<Vec<Selection>, String> {
    let mut selections = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        let line = line.trim_end();
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let [start, end, label] = fields.as_slice() else {
            return Err(format!(
                "line {}: expected 3 fields, found {}",
                number + 1,
                fields.len()
            ));
        };
        let parse_ms = |field: &str| {
            field
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("line {}: invalid timestamp '{}'", number + 1, field))
        };
        selections.push(Selection {
            start_ms: parse_ms(*start)?,
            end_ms: parse_ms(*end)?,
            label: label
                .parse()
                .map_err(|e| format!("line {}: {}", number + 1, e))?,
        });
    }
    Ok(selections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{annotation_path, read_annotations, write_recording};
    use crate::waveform::WaveformSeries;
    use std::{fs, io::Cursor, path::PathBuf};

    #[test]
    fn test_parse_selections() {
        let input = "# start\tend\tlabel\n0\t150\tN\n\n150\t990\tAF\n";
        let selections = parse_selections(Cursor::new(input)).unwrap();
        assert_eq!(
            selections,
            vec![
                Selection {
                    start_ms: 0,
                    end_ms: 150,
                    label: Label::Normal
                },
                Selection {
                    start_ms: 150,
                    end_ms: 990,
                    label: Label::AF
                },
            ]
        );
    }

    #[test]
    fn test_parse_selections_errors() {
        let err = parse_selections(Cursor::new("0\t10\n")).unwrap_err();
        assert!(err.contains("line 1"));
        assert!(parse_selections(Cursor::new("a\t10\tN\n")).is_err());
        assert!(parse_selections(Cursor::new("0\t10\tQ\n")).is_err());
    }

    #[test]
    fn test_apply_selections_skips_empty_ones() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = AnnotationSession::new(SessionParams {
            window_width: 20,
            output_dir: dir.path().to_path_buf(),
        });
        session.open(WaveformSeries::from_amplitudes("rec", 0, 100, &[0.5; 100]));
        let selections = [
            Selection {
                start_ms: 0,
                end_ms: 150,
                label: Label::Normal,
            },
            Selection {
                start_ms: 150,
                end_ms: 150,
                label: Label::Noise,
            },
            Selection {
                start_ms: 150,
                end_ms: 990,
                label: Label::AF,
            },
            Selection {
                start_ms: 990,
                end_ms: 2000,
                label: Label::Other,
            },
        ];
        let applied = apply_selections(&mut session, &selections, |session, selection| {
            session.label_selection(selection.label, selection.start_ms, selection.end_ms)
        })
        .unwrap();
        assert_eq!(applied, 2);

        let outcome = session.flush().unwrap().unwrap();
        assert_eq!(outcome.path, annotation_path(dir.path(), "rec"));
        let saved = read_annotations(&outcome.path).unwrap().unwrap();
        let labels: Vec<Label> = saved.boundaries().iter().map(|b| b.label).collect();
        assert_eq!(labels, vec![Label::Normal, Label::AF]);
    }

    fn annotate_args(recording: PathBuf, selections: PathBuf, output: PathBuf) -> AnnotateArgs {
        AnnotateArgs {
            recording_path: recording,
            selections_path: selections,
            output_dir: output,
            force: false,
            window_width: 10,
            chunk_size: 4,
            max_samples: 1000,
        }
    }

    #[test]
    fn test_recording_over_budget_is_annotated_from_chunks() {
        let dir = tempfile::tempdir().unwrap();
        // Timestamps 0, 10, ..., 240.
        let series = WaveformSeries::from_amplitudes("big", 0, 100, &[0.5; 25]);
        let recording = dir.path().join("big.kts");
        write_recording(&recording, series.samples(), None).unwrap();
        let selections = dir.path().join("selections.tsv");
        fs::write(&selections, "0\t95\tN\n95\t95\tA\n95\t170\tA\n170\t500\t~\n").unwrap();

        let loaded = dir.path().join("loaded");
        let streamed = dir.path().join("streamed");
        fs::create_dir(&loaded).unwrap();
        fs::create_dir(&streamed).unwrap();
        annotate(annotate_args(recording.clone(), selections.clone(), loaded.clone())).unwrap();
        annotate(AnnotateArgs {
            max_samples: 10,
            ..annotate_args(recording, selections, streamed.clone())
        })
        .unwrap();

        let expected = read_annotations(&annotation_path(&loaded, "big")).unwrap().unwrap();
        let boundaries: Vec<(usize, Label)> =
            expected.boundaries().iter().map(|b| (b.index, b.label)).collect();
        assert_eq!(
            boundaries,
            vec![(1, Label::Normal), (10, Label::AF), (18, Label::Noise)]
        );
        let chunked = read_annotations(&annotation_path(&streamed, "big")).unwrap();
        assert_eq!(chunked, Some(expected));
    }

    #[test]
    fn test_existing_annotation_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let series = WaveformSeries::from_amplitudes("rec", 0, 100, &[0.5; 10]);
        let recording = dir.path().join("rec.kts");
        write_recording(&recording, series.samples(), None).unwrap();
        let selections = dir.path().join("selections.tsv");
        fs::write(&selections, "0\t50\tN\n").unwrap();
        let output = dir.path().join("out");
        fs::create_dir(&output).unwrap();

        annotate(annotate_args(recording.clone(), selections.clone(), output.clone())).unwrap();
        assert!(matches!(
            annotate(annotate_args(recording.clone(), selections.clone(), output.clone())),
            Err(AnnError::InvalidInput(_))
        ));
        annotate(AnnotateArgs {
            force: true,
            ..annotate_args(recording, selections, output)
        })
        .unwrap();
    }
}
