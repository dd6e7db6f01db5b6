use super::format::{
    parse_boundary_row, parse_header, parse_sample_row, parse_section, recording_name,
    ANNOTATION_COLUMNS, ANNOTATION_KEY, SECTION_PREFIX, WAVEFORMS_KEY, WAVEFORM_COLUMNS,
};
use crate::annotation::{AnnotationSequence, Boundary, Label};
use crate::utils::{open_store_reader, AnnError, Result};
use crate::waveform::{Sample, SampleChunks, WaveformSeries};
use std::{
    io::{BufRead, BufReader, Lines, Read as ioRead},
    path::{Path, PathBuf},
};

/// Sequential reader over the keyed sections of one store file.
pub struct StoreReader {
    path: PathBuf,
    lines: Lines<BufReader<Box<dyn ioRead>>>,
    line_number: usize,
    in_section: bool,
}

impl StoreReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut lines = open_store_reader(path)?.lines();
        let header = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => return Err(AnnError::io(path, e)),
            None => return Err(AnnError::schema(path, "empty store")),
        };
        let version = parse_header(&header, path)?;
        log::debug!("{} has store version {}", path.display(), version);
        Ok(Self {
            path: path.to_path_buf(),
            lines,
            line_number: 1,
            in_section: false,
        })
    }

    /// Moves past the header of section `key` and returns its column names.
    pub fn seek(&mut self, key: &str) -> Result<Option<Vec<String>>> {
        self.in_section = false;
        while let Some(line) = self.next_line()? {
            if let Some((found, columns)) = parse_section(&line) {
                if found == key {
                    self.in_section = true;
                    return Ok(Some(columns.into_iter().map(String::from).collect()));
                }
            }
        }
        Ok(None)
    }

    /// Next non-empty data row of the current section.
    pub fn next_row(&mut self) -> Result<Option<String>> {
        while self.in_section {
            match self.next_line()? {
                None => self.in_section = false,
                Some(line) if line.starts_with(SECTION_PREFIX) => self.in_section = false,
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(Some(line)),
            }
        }
        Ok(None)
    }

    pub fn row_error(&self, message: impl AsRef<str>) -> AnnError {
        AnnError::schema(
            &self.path,
            format!("line {}: {}", self.line_number, message.as_ref()),
        )
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next() {
            None => Ok(None),
            Some(Ok(line)) => {
                self.line_number += 1;
                Ok(Some(line))
            }
            Some(Err(e)) => Err(AnnError::io(&self.path, e)),
        }
    }
}

/// Streams the `Waveforms` rows of a store, checking index contiguity.
pub struct SampleRows {
    reader: StoreReader,
    expected_index: usize,
    last_timestamp_ms: Option<i64>,
    done: bool,
}

impl SampleRows {
    fn read_sample(&mut self) -> Result<Option<Sample>> {
        let Some(line) = self.reader.next_row()? else {
            return Ok(None);
        };
        let sample = parse_sample_row(&line).map_err(|e| self.reader.row_error(e))?;
        if sample.index != self.expected_index {
            return Err(self.reader.row_error(format!(
                "expected sample index {}, found {}",
                self.expected_index, sample.index
            )));
        }
        if let Some(last) = self.last_timestamp_ms {
            if sample.timestamp_ms < last {
                return Err(self.reader.row_error("timestamps must not decrease"));
            }
        }
        self.expected_index += 1;
        self.last_timestamp_ms = Some(sample.timestamp_ms);
        Ok(Some(sample))
    }
}

impl Iterator for SampleRows {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.read_sample().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }
        result
    }
}

pub fn waveform_rows(path: &Path) -> Result<SampleRows> {
    let mut reader = StoreReader::open(path)?;
    let columns = reader
        .seek(WAVEFORMS_KEY)?
        .ok_or_else(|| AnnError::schema(path, format!("no '{}' key", WAVEFORMS_KEY)))?;
    if columns.len() != WAVEFORM_COLUMNS.len() {
        return Err(AnnError::schema(
            path,
            format!(
                "'{}' must have {} columns, found {}",
                WAVEFORMS_KEY,
                WAVEFORM_COLUMNS.len(),
                columns.len()
            ),
        ));
    }
    Ok(SampleRows {
        reader,
        expected_index: 0,
        last_timestamp_ms: None,
        done: false,
    })
}

/// Reads the whole series, refusing to hold more than `max_samples`.
pub fn read_series(path: &Path, max_samples: usize) -> Result<WaveformSeries> {
    let mut samples: Vec<Sample> = Vec::new();
    for sample in waveform_rows(path)? {
        if samples.len() >= max_samples {
            return Err(AnnError::ResourceExhausted {
                budget: max_samples,
            });
        }
        samples
            .try_reserve(1)
            .map_err(|_| AnnError::ResourceExhausted {
                budget: max_samples,
            })?;
        samples.push(sample?);
    }
    let name = recording_name(path).unwrap_or_else(|| path.display().to_string());
    WaveformSeries::new(name, samples)
}

pub fn stream_series(path: &Path, chunk_size: usize) -> Result<SampleChunks<SampleRows>> {
    Ok(SampleChunks::new(waveform_rows(path)?, chunk_size))
}

pub enum LoadedWaveform {
    Series(WaveformSeries),
    Chunked(SampleChunks<SampleRows>),
}

/// Bulk-loads a recording, falling back to lazy chunks when it is too large.
pub fn load_waveform(path: &Path, max_samples: usize, chunk_size: usize) -> Result<LoadedWaveform> {
    match read_series(path, max_samples) {
        Ok(series) => {
            log::info!("Loaded {} samples from {}", series.len(), path.display());
            Ok(LoadedWaveform::Series(series))
        }
        Err(AnnError::ResourceExhausted { budget }) => {
            log::warn!(
                "{} holds more than {} samples, reading in chunks of {}",
                path.display(),
                budget,
                chunk_size
            );
            Ok(LoadedWaveform::Chunked(stream_series(path, chunk_size)?))
        }
        Err(e) => Err(e),
    }
}

/// Reads the `AF` key. An absent or empty key means "not yet annotated".
pub fn read_annotations(path: &Path) -> Result<Option<AnnotationSequence>> {
    let mut reader = StoreReader::open(path)?;
    let Some(columns) = reader.seek(ANNOTATION_KEY)? else {
        return Ok(None);
    };
    if columns.len() != ANNOTATION_COLUMNS.len() {
        return Err(AnnError::schema(
            path,
            format!(
                "'{}' must have {} columns, found {}",
                ANNOTATION_KEY,
                ANNOTATION_COLUMNS.len(),
                columns.len()
            ),
        ));
    }

    let mut boundaries = Vec::new();
    while let Some(line) = reader.next_row()? {
        let (index, token) = parse_boundary_row(&line).map_err(|e| reader.row_error(e))?;
        let label = Label::from_token(token).inspect_err(|e| {
            log::error!("{}: {}", reader.row_error("corrupt annotation"), e);
        })?;
        boundaries.push(Boundary::new(index, label));
    }
    if boundaries.is_empty() {
        return Ok(None);
    }
    AnnotationSequence::from_boundaries(boundaries)
        .map(Some)
        .map_err(|e| AnnError::schema(path, e.to_string()))
}

/// Reads the annotation sequence, treating a missing key as a schema error.
pub fn require_annotations(path: &Path) -> Result<AnnotationSequence> {
    read_annotations(path)?
        .ok_or_else(|| AnnError::schema(path, format!("no '{}' annotations", ANNOTATION_KEY)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::encode;
    use crate::store::writer::{write_annotations, write_recording};
    use std::fs;

    fn samples(len: usize) -> Vec<Sample> {
        WaveformSeries::from_amplitudes("rec", 1_543_651_200_000, 250, &vec![0.5; len])
            .samples()
            .to_vec()
    }

    #[test]
    fn test_read_series_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patient_7.kts");
        let written = samples(40);
        write_recording(&path, &written, None).unwrap();

        let series = read_series(&path, 1000).unwrap();
        assert_eq!(series.name(), "patient_7");
        assert_eq!(series.samples(), &written[..]);
    }

    #[test]
    fn test_read_series_over_budget_falls_back_to_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.kts.gz");
        write_recording(&path, &samples(25), None).unwrap();

        assert!(matches!(
            read_series(&path, 10),
            Err(AnnError::ResourceExhausted { budget: 10 })
        ));

        match load_waveform(&path, 10, 10).unwrap() {
            LoadedWaveform::Chunked(chunks) => {
                let sizes: Vec<usize> = chunks.map(|chunk| chunk.unwrap().len()).collect();
                assert_eq!(sizes, vec![10, 10, 5]);
            }
            LoadedWaveform::Series(_) => panic!("expected chunked fallback"),
        }
        assert!(matches!(
            load_waveform(&path, 100, 10).unwrap(),
            LoadedWaveform::Series(_)
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.kts");
        assert!(matches!(read_series(&path, 10), Err(AnnError::NotFound(_))));
        assert!(matches!(read_annotations(&path), Err(AnnError::NotFound(_))));
    }

    #[test]
    fn test_missing_waveforms_key_is_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ann.kts");
        write_annotations(&path, &encode(vec![(0, Label::AF)]).unwrap()).unwrap();
        assert!(matches!(
            read_series(&path, 10),
            Err(AnnError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_non_contiguous_rows_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gap.kts");
        fs::write(
            &path,
            "#ecgann-store\t1.0.0\n>Waveforms\tindex\ttimestamp_ms\tII\n0\t0\t0.1\n2\t8\t0.1\n",
        )
        .unwrap();
        let err = read_series(&path, 10).unwrap_err();
        assert!(err.to_string().contains("line 4: expected sample index 1, found 2"));
    }

    #[test]
    fn test_read_annotations_after_waveforms() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("both.kts");
        let seq = encode(vec![(0, Label::Normal), (12, Label::AF)]).unwrap();
        write_recording(&path, &samples(20), Some(&seq)).unwrap();

        assert_eq!(read_annotations(&path).unwrap(), Some(seq));
        assert_eq!(read_series(&path, 100).unwrap().len(), 20);
    }

    #[test]
    fn test_absent_or_empty_key_is_not_annotated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.kts");
        write_recording(&path, &samples(3), None).unwrap();
        assert_eq!(read_annotations(&path).unwrap(), None);
        assert!(require_annotations(&path).is_err());

        let empty = dir.path().join("empty.kts");
        write_annotations(&empty, &AnnotationSequence::new()).unwrap();
        assert_eq!(read_annotations(&empty).unwrap(), None);
    }

    #[test]
    fn test_corrupt_label_is_unknown_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.kts");
        fs::write(&path, "#ecgann-store\t1.0.0\n>AF\tindex\tlabel\n0\tN\n10\tX\n").unwrap();
        assert!(matches!(
            read_annotations(&path),
            Err(AnnError::UnknownLabel(token)) if token == "X"
        ));
    }

    #[test]
    fn test_unordered_annotation_rows_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unordered.kts");
        fs::write(&path, "#ecgann-store\t1.0.0\n>AF\tindex\tlabel\n10\tN\n5\tA\n").unwrap();
        assert!(matches!(
            read_annotations(&path),
            Err(AnnError::SchemaMismatch { .. })
        ));
    }
}
