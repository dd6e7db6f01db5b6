//! Segment-wise classification of a recording by an external detector.

use crate::annotation::{encode, AnnotationSequence, Label};
use crate::utils::{AnnError, Result};
use crate::waveform::{Sample, DISCONNECTED_THRESHOLD};
use std::{
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
};

pub const DEFAULT_SAMPLING_RATE: u32 = 240;
pub const DEFAULT_SEGMENT_SECONDS: u32 = 30;

/// Opaque detector invoked once per segment.
pub trait SegmentClassifier {
    fn classify(&mut self, amplitudes: &[f64], sampling_rate: u32) -> Result<Label>;
}

#[derive(Debug, Clone)]
pub struct DetectParams {
    pub sampling_rate: u32,
    pub segment_seconds: u32,
    pub disconnected_threshold: f64,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            sampling_rate: DEFAULT_SAMPLING_RATE,
            segment_seconds: DEFAULT_SEGMENT_SECONDS,
            disconnected_threshold: DISCONNECTED_THRESHOLD,
        }
    }
}

impl DetectParams {
    pub fn segment_len(&self) -> usize {
        (self.segment_seconds as usize * self.sampling_rate as usize).max(1)
    }
}

/// Labels every segment of a chunked sample stream.
///
/// Segments span chunk borders; a shorter trailing segment is still
/// classified. A segment that dips to the disconnected threshold is
/// `NoSignal` and never reaches the classifier.
pub fn classify_recording<I, C>(
    chunks: I,
    params: &DetectParams,
    classifier: &mut C,
) -> Result<AnnotationSequence>
where
    I: IntoIterator<Item = Result<Vec<Sample>>>,
    C: SegmentClassifier + ?Sized,
{
    let segment_len = params.segment_len();
    let mut labels = Vec::new();
    let mut segment: Vec<f64> = Vec::with_capacity(segment_len);
    let mut segment_start = 0;

    for chunk in chunks {
        for sample in chunk? {
            if segment.is_empty() {
                segment_start = sample.index;
            }
            segment.push(sample.amplitude);
            if segment.len() == segment_len {
                labels.push((segment_start, classify_segment(&segment, params, classifier)?));
                segment.clear();
            }
        }
    }
    if !segment.is_empty() {
        labels.push((segment_start, classify_segment(&segment, params, classifier)?));
    }
    log::debug!("Classified {} segments", labels.len());
    encode(labels)
}

fn classify_segment<C>(segment: &[f64], params: &DetectParams, classifier: &mut C) -> Result<Label>
where
    C: SegmentClassifier + ?Sized,
{
    let min = segment.iter().copied().fold(f64::INFINITY, f64::min);
    if min <= params.disconnected_threshold {
        Ok(Label::NoSignal)
    } else {
        classifier.classify(segment, params.sampling_rate)
    }
}

/// Runs an external program per segment.
///
/// The program receives the sampling rate on the first line of stdin and one
/// amplitude per line after it, and prints a single label token.
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandClassifier {
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

impl SegmentClassifier for CommandClassifier {
    fn classify(&mut self, amplitudes: &[f64], sampling_rate: u32) -> Result<Label> {
        let io_err = |e| AnnError::io(&self.program, e);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(io_err)?;

        if let Some(mut stdin) = child.stdin.take() {
            let mut payload = format!("{}\n", sampling_rate);
            for amplitude in amplitudes {
                payload.push_str(&amplitude.to_string());
                payload.push('\n');
            }
            stdin.write_all(payload.as_bytes()).map_err(io_err)?;
        }
        let output = child.wait_with_output().map_err(io_err)?;
        if !output.status.success() {
            return Err(AnnError::InvalidInput(format!(
                "Classifier {} exited with {}",
                self.program.display(),
                output.status
            )));
        }
        Label::from_token(String::from_utf8_lossy(&output.stdout).trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Labels a segment AF when its mean is above zero, recording every call.
    #[derive(Default)]
    struct MeanClassifier {
        calls: Vec<usize>,
    }

    impl SegmentClassifier for MeanClassifier {
        fn classify(&mut self, amplitudes: &[f64], _sampling_rate: u32) -> Result<Label> {
            self.calls.push(amplitudes.len());
            let mean = amplitudes.iter().sum::<f64>() / amplitudes.len() as f64;
            Ok(if mean > 0.0 { Label::AF } else { Label::Normal })
        }
    }

    fn params() -> DetectParams {
        DetectParams {
            sampling_rate: 2,
            segment_seconds: 2,
            ..DetectParams::default()
        }
    }

    fn chunked(amplitudes: &[f64], chunk_size: usize) -> Vec<Result<Vec<Sample>>> {
        let samples: Vec<Sample> = amplitudes
            .iter()
            .enumerate()
            .map(|(i, &a)| Sample::new(i, i as i64 * 500, a))
            .collect();
        samples
            .chunks(chunk_size)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect()
    }

    fn pairs(seq: &AnnotationSequence) -> Vec<(usize, Label)> {
        seq.boundaries().iter().map(|b| (b.index, b.label)).collect()
    }

    #[test]
    fn test_default_segment_is_thirty_seconds() {
        assert_eq!(DetectParams::default().segment_len(), 7200);
    }

    #[test]
    fn test_segments_span_chunks() {
        let amplitudes = [
            -1.0, -1.0, -1.0, -1.0, // N
            1.0, 1.0, 1.0, 1.0, // A
            2.0, 2.0, 2.0, 2.0, // A
            -1.0, -1.0, // trailing N
        ];
        let mut classifier = MeanClassifier::default();
        let seq = classify_recording(chunked(&amplitudes, 3), &params(), &mut classifier).unwrap();
        assert_eq!(classifier.calls, vec![4, 4, 4, 2]);
        assert_eq!(
            pairs(&seq),
            vec![(0, Label::Normal), (4, Label::AF), (12, Label::Normal)]
        );
    }

    #[test]
    fn test_disconnected_segment_skips_classifier() {
        let amplitudes = [1.0, 1.0, -79.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let mut classifier = MeanClassifier::default();
        let seq = classify_recording(chunked(&amplitudes, 8), &params(), &mut classifier).unwrap();
        assert_eq!(classifier.calls, vec![4]);
        assert_eq!(pairs(&seq), vec![(0, Label::NoSignal), (4, Label::AF)]);
    }

    #[test]
    fn test_no_signal_fill_counts_as_disconnected() {
        let amplitudes = [crate::waveform::NO_SIGNAL_FILL, 0.5];
        let mut classifier = MeanClassifier::default();
        let seq = classify_recording(chunked(&amplitudes, 1), &params(), &mut classifier).unwrap();
        assert!(classifier.calls.is_empty());
        assert_eq!(pairs(&seq), vec![(0, Label::NoSignal)]);
    }

    #[test]
    fn test_empty_stream_gives_empty_sequence() {
        let mut classifier = MeanClassifier::default();
        let seq = classify_recording(Vec::new(), &params(), &mut classifier).unwrap();
        assert!(seq.is_empty());
    }

    #[test]
    fn test_stream_error_propagates() {
        let mut chunks = chunked(&[1.0; 4], 4);
        chunks.push(Err(AnnError::InvalidInput("broken row".into())));
        let mut classifier = MeanClassifier::default();
        assert!(matches!(
            classify_recording(chunks, &params(), &mut classifier),
            Err(AnnError::InvalidInput(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_classifier_reads_token() {
        let mut classifier = CommandClassifier::new(
            PathBuf::from("sh"),
            vec!["-c".into(), "cat > /dev/null; echo '~'".into()],
        );
        assert_eq!(classifier.classify(&[0.1, 0.2], 240).unwrap(), Label::Noise);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_classifier_rejects_unknown_token() {
        let mut classifier = CommandClassifier::new(
            PathBuf::from("sh"),
            vec!["-c".into(), "cat > /dev/null; echo X".into()],
        );
        assert!(matches!(
            classifier.classify(&[0.1], 240),
            Err(AnnError::UnknownLabel(_))
        ));
    }
}
