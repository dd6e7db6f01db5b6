//! Recording discovery and annotated status.

use super::format::{is_store_file, recording_name, STORE_EXTENSION};
use crate::utils::{AnnError, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordingEntry {
    pub name: String,
    pub path: PathBuf,
    pub extension: String,
    pub size_mib: f64,
    pub annotated: bool,
}

/// Location of the annotation store for recording `name`.
pub fn annotation_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", name, STORE_EXTENSION))
}

pub fn is_annotated(output_dir: &Path, name: &str) -> bool {
    annotation_path(output_dir, name).is_file()
}

/// Store files directly inside `input_dir`, sorted by recording name.
pub fn list_recordings(input_dir: &Path, output_dir: &Path) -> Result<Vec<RecordingEntry>> {
    let entries = fs::read_dir(input_dir).map_err(|e| AnnError::io(input_dir, e))?;
    let mut recordings = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AnnError::io(input_dir, e))?;
        let path = entry.path();
        if !path.is_file() || !is_store_file(&path) {
            continue;
        }
        let Some(name) = recording_name(&path) else {
            continue;
        };
        let size = entry.metadata().map_err(|e| AnnError::io(&path, e))?.len();
        let extension = path
            .file_name()
            .map(|file_name| file_name.to_string_lossy()[name.len()..].to_string())
            .unwrap_or_default();
        recordings.push(RecordingEntry {
            annotated: is_annotated(output_dir, &name),
            size_mib: size as f64 / (1024.0 * 1024.0),
            name,
            path,
            extension,
        });
    }
    recordings.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!(
        "Found {} recordings in {}",
        recordings.len(),
        input_dir.display()
    );
    Ok(recordings)
}

/// Recording names present in both directories.
pub fn paired_recordings(dir_a: &Path, dir_b: &Path) -> Result<Vec<(String, PathBuf, PathBuf)>> {
    let in_a = list_recordings(dir_a, dir_a)?;
    let in_b = list_recordings(dir_b, dir_b)?;
    let pairs = in_a
        .into_iter()
        .filter_map(|a| {
            in_b.iter()
                .find(|b| b.name == a.name)
                .map(|b| (a.name.clone(), a.path.clone(), b.path.clone()))
        })
        .collect();
    Ok(pairs)
}
