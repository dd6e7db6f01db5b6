//! Line layout of the keyed table store.
//!
//! ```text
//! #ecgann-store   1.0.0
//! >Waveforms      index   timestamp_ms    II
//! 0               1543651200000           0.125
//! >AF             index   label
//! 0               N
//! ```

use crate::annotation::Boundary;
use crate::utils::{AnnError, Result};
use crate::waveform::{Sample, NO_SIGNAL_FILL};
use semver::Version;
use std::path::Path;

pub const STORE_MAGIC: &str = "#ecgann-store";
pub const FORMAT_VERSION: Version = Version::new(1, 0, 0);
pub const STORE_EXTENSION: &str = "kts";
pub const SECTION_PREFIX: char = '>';

pub const WAVEFORMS_KEY: &str = "Waveforms";
pub const ANNOTATION_KEY: &str = "AF";
pub const WAVEFORM_COLUMNS: [&str; 3] = ["index", "timestamp_ms", "II"];
pub const ANNOTATION_COLUMNS: [&str; 2] = ["index", "label"];

pub fn header_line() -> String {
    format!("{}\t{}", STORE_MAGIC, FORMAT_VERSION)
}

pub fn section_line(key: &str, columns: &[&str]) -> String {
    format!("{}{}\t{}", SECTION_PREFIX, key, columns.join("\t"))
}

/// Validates the first line of a store and returns its format version.
pub fn parse_header(line: &str, path: &Path) -> Result<Version> {
    let (magic, version) = line
        .split_once('\t')
        .ok_or_else(|| AnnError::schema(path, "missing store header"))?;
    if magic != STORE_MAGIC {
        return Err(AnnError::schema(path, format!("unexpected header '{}'", line)));
    }
    let version = Version::parse(version.trim())
        .map_err(|e| AnnError::schema(path, format!("invalid format version: {}", e)))?;
    if version.major != FORMAT_VERSION.major {
        return Err(AnnError::schema(
            path,
            format!("unsupported format version {}", version),
        ));
    }
    Ok(version)
}

/// Splits a `>KEY<TAB>columns...` line, `None` for data rows.
pub fn parse_section(line: &str) -> Option<(&str, Vec<&str>)> {
    let rest = line.strip_prefix(SECTION_PREFIX)?;
    let mut fields = rest.split('\t');
    let key = fields.next().unwrap_or_default();
    Some((key, fields.collect()))
}

pub fn parse_sample_row(line: &str) -> std::result::Result<Sample, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    let [index, timestamp, amplitude] = fields.as_slice() else {
        return Err(format!(
            "expected {} fields, found {}",
            WAVEFORM_COLUMNS.len(),
            fields.len()
        ));
    };
    let index = index
        .parse()
        .map_err(|_| format!("invalid index '{}'", index))?;
    let timestamp_ms = timestamp
        .parse()
        .map_err(|_| format!("invalid timestamp '{}'", timestamp))?;
    let amplitude = match amplitude.trim() {
        "" | "nan" | "NaN" => NO_SIGNAL_FILL,
        value => value
            .parse::<f64>()
            .map_err(|_| format!("invalid amplitude '{}'", value))?,
    };
    Ok(Sample::new(index, timestamp_ms, amplitude))
}

pub fn format_sample_row(sample: &Sample) -> String {
    format!(
        "{}\t{}\t{}",
        sample.index, sample.timestamp_ms, sample.amplitude
    )
}

/// Splits an `index<TAB>token` row; the token is decoded by the caller.
pub fn parse_boundary_row(line: &str) -> std::result::Result<(usize, &str), String> {
    let (index, token) = line
        .split_once('\t')
        .ok_or_else(|| format!("expected {} fields", ANNOTATION_COLUMNS.len()))?;
    let index = index
        .parse()
        .map_err(|_| format!("invalid index '{}'", index))?;
    Ok((index, token.trim_end()))
}

pub fn format_boundary_row(boundary: &Boundary) -> String {
    format!("{}\t{}", boundary.index, boundary.label.token())
}

/// Recording identity: the file name without `.gz` and store extensions.
pub fn recording_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name
        .strip_suffix(".gz")
        .or_else(|| file_name.strip_suffix(".gzip"))
        .unwrap_or(file_name);
    let stem = Path::new(stem);
    let name = match stem.extension() {
        Some(_) => stem.file_stem()?.to_str()?,
        None => stem.to_str()?,
    };
    (!name.is_empty()).then(|| name.to_string())
}

pub fn is_store_file(path: &Path) -> bool {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let suffix = format!(".{}", STORE_EXTENSION);
    file_name.ends_with(&suffix) || file_name.ends_with(&format!("{}.gz", suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Label;
    use std::path::PathBuf;

    #[test]
    fn test_header_round_trip() {
        let path = PathBuf::from("rec.kts");
        assert_eq!(parse_header(&header_line(), &path).unwrap(), FORMAT_VERSION);
        assert!(parse_header("#ecgann-store\t1.4.2", &path).is_ok());
    }

    #[test]
    fn test_header_rejects_other_major_or_magic() {
        let path = PathBuf::from("rec.kts");
        assert!(matches!(
            parse_header("#ecgann-store\t2.0.0", &path),
            Err(AnnError::SchemaMismatch { .. })
        ));
        assert!(parse_header("#other\t1.0.0", &path).is_err());
        assert!(parse_header("0\tN", &path).is_err());
        assert!(parse_header("#ecgann-store\tone", &path).is_err());
    }

    #[test]
    fn test_parse_section() {
        let line = section_line(WAVEFORMS_KEY, &WAVEFORM_COLUMNS);
        assert_eq!(line, ">Waveforms\tindex\ttimestamp_ms\tII");
        let (key, columns) = parse_section(&line).unwrap();
        assert_eq!(key, "Waveforms");
        assert_eq!(columns, vec!["index", "timestamp_ms", "II"]);
        assert!(parse_section("0\tN").is_none());
    }

    #[test]
    fn test_parse_sample_row() {
        let sample = parse_sample_row("12\t1543651200048\t-0.25").unwrap();
        assert_eq!(sample, Sample::new(12, 1_543_651_200_048, -0.25));
        let missing = parse_sample_row("13\t1543651200052\t").unwrap();
        assert_eq!(missing.amplitude, NO_SIGNAL_FILL);
        assert!(missing.is_disconnected());
        assert!(parse_sample_row("13\t1543651200052").is_err());
        assert!(parse_sample_row("x\t1\t0.0").is_err());
    }

    #[test]
    fn test_parse_boundary_row() {
        assert_eq!(parse_boundary_row("2000\t~").unwrap(), (2000, "~"));
        assert_eq!(parse_boundary_row("0\tnAF\r").unwrap(), (0, "nAF"));
        assert!(parse_boundary_row("2000").is_err());
        assert!(parse_boundary_row("-5\tN").is_err());
        let boundary = Boundary::new(2000, Label::Noise);
        assert_eq!(format_boundary_row(&boundary), "2000\t~");
    }

    #[test]
    fn test_recording_name() {
        assert_eq!(
            recording_name(Path::new("/data/patient_01.kts")).as_deref(),
            Some("patient_01")
        );
        assert_eq!(
            recording_name(Path::new("patient_01.kts.gz")).as_deref(),
            Some("patient_01")
        );
        assert_eq!(recording_name(Path::new("bare")).as_deref(), Some("bare"));
        assert!(is_store_file(Path::new("a.kts.gz")));
        assert!(is_store_file(Path::new("A.KTS")));
        assert!(!is_store_file(Path::new("a.hd5")));
    }
}
