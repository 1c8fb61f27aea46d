//! Error taxonomy for the project model.
//!
//! Single-resource operations (open one document, read one attribute)
//! return these errors directly; batch operations capture the per-item
//! variants into structured results and keep going.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error produced by the project model.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("unexpected structure in {}: {detail}", path.display())]
    Structure { path: PathBuf, detail: String },

    #[error("dependency cycle: {}", chain.join(" -> "))]
    CycleDetected { chain: Vec<String> },

    #[error("malformed xml in {}: {message}", path.display())]
    Xml { path: PathBuf, message: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Classify an I/O error against the path it occurred on.
    pub fn io(path: &Path, source: io::Error) -> Error {
        match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::AlreadyExists => Error::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => Error::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Wrap an XML parse/serialize failure.
    pub fn xml(path: &Path, message: impl ToString) -> Error {
        Error::Xml {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Report an unexpected document shape.
    pub fn structure(path: &Path, detail: impl Into<String>) -> Error {
        Error::Structure {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }

    /// Whether a per-library export captures this error into its result
    /// instead of aborting the batch. Only missing and already-present
    /// filesystem entries are expected mid-export; everything else
    /// propagates.
    pub fn is_export_capturable(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::AlreadyExists { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_classification() {
        let path = Path::new("/some/file");

        let err = Error::io(path, io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(err.is_export_capturable());

        let err = Error::io(path, io::Error::new(io::ErrorKind::AlreadyExists, "there"));
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert!(err.is_export_capturable());

        let err = Error::io(path, io::Error::new(io::ErrorKind::PermissionDenied, "no"));
        assert!(matches!(err, Error::Io { .. }));
        assert!(!err.is_export_capturable());
    }

    #[test]
    fn test_cycle_display() {
        let err = Error::CycleDetected {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle: A -> B -> A");
    }
}
