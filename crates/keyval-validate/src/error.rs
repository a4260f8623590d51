//! Error types for the validation engine.

use thiserror::Error;

use keyval_dictionary::DictionaryError;
use keyval_ingest::IngestError;
use keyval_model::ModelError;

/// Failures that prevent a report from being produced.
///
/// Problems with the submission itself are not errors of this type; they
/// are reported as `STRUCTURAL` entries of the returned report.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Model(#[from] ModelError),

    /// File type missing from the schema.
    #[error("file type not in dictionary: {file_type}")]
    UnknownFileType { file_type: String },

    /// Requested data type missing from the layout.
    #[error("data type not in layout: {data_type}")]
    UnknownDataType { data_type: String },

    /// The run was aborted through its cancel flag.
    #[error("validation cancelled")]
    Cancelled,
}

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, ValidateError>;
