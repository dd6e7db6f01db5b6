use crate::cli::DetectArgs;
use crate::detect::{classify_recording, CommandClassifier, DetectParams};
use crate::store::{annotation_path, recording_name, stream_series, write_annotations};
use crate::utils::{AnnError, Result};
use crate::waveform::DISCONNECTED_THRESHOLD;

pub fn detect(args: DetectArgs) -> Result<()> {
    let name = recording_name(&args.recording_path).ok_or_else(|| {
        AnnError::InvalidInput(format!(
            "Not a recording store: {}",
            args.recording_path.display()
        ))
    })?;
    let output_path = annotation_path(&args.output_dir, &name);
    if output_path.is_file() && !args.force {
        log::warn!(
            "{} is already annotated in {}, skipping",
            name,
            args.output_dir.display()
        );
        return Ok(());
    }

    let params = DetectParams {
        sampling_rate: args.sampling_rate,
        segment_seconds: args.segment_seconds,
        disconnected_threshold: DISCONNECTED_THRESHOLD,
    };
    log::info!(
        "Classifying {} in segments of {} samples",
        name,
        params.segment_len()
    );
    let mut classifier = CommandClassifier::new(args.classifier, args.classifier_args);
    let chunks = stream_series(&args.recording_path, args.chunk_size)?;
    let seq = classify_recording(chunks, &params, &mut classifier)?;
    write_annotations(&output_path, &seq)?;
    log::info!(
        "Saved {} runs for {} to {}",
        seq.len(),
        name,
        output_path.display()
    );
    Ok(())
}
