use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the annotation core and the keyed table store.
#[derive(Debug, Error)]
pub enum AnnError {
    /// A recording or annotation file does not exist.
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),
    /// A store is missing an expected key or a row has the wrong shape.
    #[error("Schema mismatch in {}: {message}", path.display())]
    SchemaMismatch { path: PathBuf, message: String },
    /// A bulk read would exceed the configured sample budget.
    #[error("Bulk read of more than {budget} samples refused")]
    ResourceExhausted { budget: usize },
    /// No sample lies strictly after `start_ms` and at or before `end_ms`.
    #[error("Empty selection ({start_ms}, {end_ms}]: advance your selection")]
    EmptySelection { start_ms: i64, end_ms: i64 },
    /// An index outside the loaded series.
    #[error("Index {index} is outside the loaded series (length {len})")]
    IndexOutOfRange { index: usize, len: usize },
    /// An index that precedes the first boundary of a sequence.
    #[error("Index {index} precedes the first annotation boundary")]
    IndexBeforeFirstBoundary { index: usize },
    /// A label token that is not part of the alphabet.
    #[error("Unknown label: '{0}'")]
    UnknownLabel(String),
    /// An annotation store could not be written.
    #[error("Failed to persist {}: {source}", path.display())]
    PersistFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Codec input must be strictly ascending by index.
    #[error("Index {index} follows index {previous}; input must be strictly ascending")]
    UnorderedStream { previous: usize, index: usize },
    #[error("Failed to render plot: {0}")]
    Render(String),
    #[error("No recording is open")]
    NoRecordingOpen,
    #[error("{0}")]
    InvalidInput(String),
}

impl AnnError {
    /// Conditions the user can correct by adjusting the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnnError::EmptySelection { .. }
                | AnnError::IndexOutOfRange { .. }
                | AnnError::IndexBeforeFirstBoundary { .. }
        )
    }

    pub(crate) fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AnnError::SchemaMismatch {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            AnnError::NotFound(path)
        } else {
            AnnError::Io { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(AnnError::EmptySelection {
            start_ms: 300,
            end_ms: 300
        }
        .is_recoverable());
        assert!(AnnError::IndexOutOfRange { index: 10, len: 5 }.is_recoverable());
        assert!(!AnnError::UnknownLabel("X".to_string()).is_recoverable());
        assert!(!AnnError::ResourceExhausted { budget: 1 }.is_recoverable());
    }

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let err = AnnError::io(
            "missing.kts",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, AnnError::NotFound(_)));
        assert_eq!(err.to_string(), "Not found: missing.kts");
    }
}
