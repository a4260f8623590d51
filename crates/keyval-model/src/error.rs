use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid file type name: {0:?}")]
    InvalidFileType(String),
    #[error("invalid data type name: {0:?}")]
    InvalidDataType(String),
    #[error("a key needs at least one value")]
    EmptyKey,
}

pub type Result<T> = std::result::Result<T, ModelError>;
