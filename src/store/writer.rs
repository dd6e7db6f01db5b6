use super::format::{
    format_boundary_row, format_sample_row, header_line, section_line, ANNOTATION_COLUMNS,
    ANNOTATION_KEY, WAVEFORMS_KEY, WAVEFORM_COLUMNS,
};
use crate::annotation::AnnotationSequence;
use crate::utils::{is_gzipped, AnnError, Result};
use crate::waveform::Sample;
use flate2::{write::GzEncoder, Compression};
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
};

/// Writes `AF`-only annotation store, replacing any previous content.
pub fn write_annotations(path: &Path, seq: &AnnotationSequence) -> Result<()> {
    write_atomically(path, |out| {
        writeln!(out, "{}", header_line())?;
        write_annotation_section(out, seq)
    })?;
    log::debug!("Wrote {} boundaries to {}", seq.len(), path.display());
    Ok(())
}

/// Writes a recording store with its samples and optional annotations.
pub fn write_recording(
    path: &Path,
    samples: &[Sample],
    annotations: Option<&AnnotationSequence>,
) -> Result<()> {
    write_atomically(path, |out| {
        writeln!(out, "{}", header_line())?;
        writeln!(out, "{}", section_line(WAVEFORMS_KEY, &WAVEFORM_COLUMNS))?;
        for sample in samples {
            writeln!(out, "{}", format_sample_row(sample))?;
        }
        match annotations {
            Some(seq) => write_annotation_section(out, seq),
            None => Ok(()),
        }
    })
}

fn write_annotation_section(out: &mut dyn Write, seq: &AnnotationSequence) -> io::Result<()> {
    writeln!(out, "{}", section_line(ANNOTATION_KEY, &ANNOTATION_COLUMNS))?;
    for boundary in seq.boundaries() {
        writeln!(out, "{}", format_boundary_row(boundary))?;
    }
    Ok(())
}

/// Writes into a sibling temporary file and renames it over `path`.
fn write_atomically<F>(path: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let file_name = path.file_name().ok_or_else(|| {
        AnnError::InvalidInput(format!("Not a file path: {}", path.display()))
    })?;
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    let result = (|| -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        if is_gzipped(path) {
            let mut encoder = GzEncoder::new(writer, Compression::default());
            body(&mut encoder)?;
            encoder.finish()?.flush()?;
        } else {
            body(&mut writer)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)
    })();

    result.map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        AnnError::PersistFailed {
            path: path.to_path_buf(),
            source,
        }
    })
}
