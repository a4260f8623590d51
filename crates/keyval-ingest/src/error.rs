//! Error types for submission file ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while finding or reading submission files.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to open a data file.
    #[error("failed to open file {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Row Errors ===
    /// Underlying reader failed (I/O or decompression).
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A line is not valid UTF-8.
    #[error("invalid UTF-8 in {path} at line {line}")]
    InvalidUtf8 { path: PathBuf, line: u64 },

    /// File has no header row.
    #[error("file has no header row: {path}")]
    MissingHeader { path: PathBuf },
}

impl IngestError {
    /// True when the file content itself is malformed, as opposed to an
    /// environment failure such as a missing directory.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            IngestError::InvalidUtf8 { .. } | IngestError::MissingHeader { .. }
        )
    }

    /// Line the problem was found on, if known.
    pub fn line(&self) -> Option<u64> {
        match self {
            IngestError::InvalidUtf8 { line, .. } => Some(*line),
            IngestError::MissingHeader { .. } => Some(1),
            _ => None,
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::DirectoryNotFound {
            path: PathBuf::from("/path/to/submission"),
        };
        assert_eq!(err.to_string(), "directory not found: /path/to/submission");
    }

    #[test]
    fn test_malformed_classification() {
        let err = IngestError::InvalidUtf8 {
            path: PathBuf::from("donor.txt"),
            line: 7,
        };
        assert!(err.is_malformed());
        assert_eq!(err.line(), Some(7));
        let err = IngestError::DirectoryNotFound {
            path: PathBuf::from("x"),
        };
        assert!(!err.is_malformed());
    }
}
