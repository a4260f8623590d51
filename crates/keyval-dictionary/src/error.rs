#![deny(unsafe_code)]

use std::path::PathBuf;

use keyval_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dictionary JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse layout TOML {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid file name pattern for {file_type}: {source}")]
    Pattern {
        file_type: String,
        #[source]
        source: regex::Error,
    },

    #[error("duplicate file type in dictionary: {file_type}")]
    DuplicateFileType { file_type: String },

    #[error("{file_type} references unknown field '{field}'")]
    UnknownField { file_type: String, field: String },

    #[error("{referenced_by} references unknown file type '{file_type}'")]
    UnknownFileType {
        file_type: String,
        referenced_by: String,
    },

    #[error("invalid relation on {file_type}: {message}")]
    InvalidRelation { file_type: String, message: String },

    #[error("invalid layout: {message}")]
    InvalidLayout { message: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl DictionaryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn relation(file_type: &str, message: impl Into<String>) -> Self {
        Self::InvalidRelation {
            file_type: file_type.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn layout(message: impl Into<String>) -> Self {
        Self::InvalidLayout {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DictionaryError>;
