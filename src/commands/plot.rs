use crate::cli::PlotArgs;
use crate::plot::{plot_chunks, plot_recording, AnnotationLayer, PlotParams};
use crate::store::{
    load_waveform, recording_name, require_annotations, stream_series, LoadedWaveform,
};
use crate::utils::{AnnError, Result};
use std::path::Path;
use trackplot::generate_image;

pub fn plot(args: PlotArgs) -> Result<()> {
    let layers = args
        .annotation_paths
        .iter()
        .map(|path| {
            Ok(AnnotationLayer {
                name: layer_name(path),
                seq: require_annotations(path)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let params = PlotParams {
        columns: args.columns,
        target: args.label,
        ..PlotParams::default()
    };
    let track_plot = match load_waveform(&args.recording_path, args.max_samples, args.chunk_size)? {
        LoadedWaveform::Series(series) => plot_recording(&series, &layers, &params)?,
        LoadedWaveform::Chunked(chunks) => {
            // Bucket bounds depend on the total length.
            let mut len = 0;
            for chunk in chunks {
                len += chunk?.len();
            }
            let name = recording_name(&args.recording_path)
                .unwrap_or_else(|| args.recording_path.display().to_string());
            let chunks = stream_series(&args.recording_path, args.chunk_size)?;
            plot_chunks(&name, len, chunks, &layers, &params)?
        }
    };
    generate_image(&track_plot, Path::new(&args.output_path)).map_err(AnnError::Render)?;
    log::info!("Wrote {}", args.output_path);
    Ok(())
}

/// Annotation stores share the recording's name, so tracks are told apart
/// by the directory holding them.
fn layer_name(path: &Path) -> String {
    path.parent()
        .and_then(|dir| dir.file_name())
        .map(|dir| dir.to_string_lossy().to_string())
        .or_else(|| recording_name(path))
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{encode, Label};
    use crate::store::{write_annotations, write_recording};
    use crate::waveform::WaveformSeries;
    use std::fs;

    #[test]
    fn test_layer_name_from_directory() {
        assert_eq!(layer_name(Path::new("human/rec.kts")), "human");
        assert_eq!(layer_name(Path::new("rec.kts")), "rec");
    }

    fn plot_args(recording: &Path, annotations: &Path, image: &Path) -> PlotArgs {
        PlotArgs {
            recording_path: recording.to_path_buf(),
            annotation_paths: vec![annotations.to_path_buf()],
            output_path: image.to_string_lossy().to_string(),
            label: Label::AF,
            columns: 2000,
            chunk_size: 4,
            max_samples: 1000,
        }
    }

    #[test]
    fn test_plot_to_svg() {
        let dir = tempfile::tempdir().unwrap();
        let series = WaveformSeries::from_amplitudes("rec", 0, 240, &[0.1, 0.4, -0.2, 0.3]);
        let recording = dir.path().join("rec.kts");
        write_recording(&recording, series.samples(), None).unwrap();
        fs::create_dir(dir.path().join("human")).unwrap();
        let annotations = dir.path().join("human").join("rec.kts");
        let seq = encode([(0, Label::Normal), (2, Label::AF)]).unwrap();
        write_annotations(&annotations, &seq).unwrap();

        let image = dir.path().join("rec.svg");
        plot(plot_args(&recording, &annotations, &image)).unwrap();
        let svg = fs::read_to_string(&image).unwrap();
        assert!(svg.contains(">human</text>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
    }

    #[test]
    fn test_recording_over_budget_is_plotted_from_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let amplitudes: Vec<f64> = (0..25).map(|i| (i % 5) as f64 - 2.0).collect();
        let series = WaveformSeries::from_amplitudes("big", 0, 100, &amplitudes);
        let recording = dir.path().join("big.kts");
        write_recording(&recording, series.samples(), None).unwrap();
        fs::create_dir(dir.path().join("human")).unwrap();
        let annotations = dir.path().join("human").join("big.kts");
        let seq = encode([(0, Label::Normal), (12, Label::AF)]).unwrap();
        write_annotations(&annotations, &seq).unwrap();

        let loaded = dir.path().join("loaded.svg");
        let chunked = dir.path().join("chunked.svg");
        plot(plot_args(&recording, &annotations, &loaded)).unwrap();
        plot(PlotArgs {
            max_samples: 10,
            ..plot_args(&recording, &annotations, &chunked)
        })
        .unwrap();
        assert_eq!(
            fs::read_to_string(&chunked).unwrap(),
            fs::read_to_string(&loaded).unwrap()
        );
    }
}
