use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FileType, Key};

/// Kind of a key validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Duplicate primary key (full submission).
    Uniqueness,
    /// Primary key already present in the previously accepted release.
    UniqueOriginal,
    /// Primary key repeated within the incremental delta.
    UniqueNew,
    /// Foreign key with no matching parent row.
    PrimaryRelation,
    /// Secondary foreign key with no matching parent row.
    SecondaryRelation,
    /// Parent row never referenced by a child.
    Surjection,
    /// Submission cannot be processed (missing or ambiguous file, bad row).
    Structural,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Uniqueness,
        ErrorKind::UniqueOriginal,
        ErrorKind::UniqueNew,
        ErrorKind::PrimaryRelation,
        ErrorKind::SecondaryRelation,
        ErrorKind::Surjection,
        ErrorKind::Structural,
    ];

    /// Fatal kinds abort the run; all others accumulate.
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::Structural)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Uniqueness => "UNIQUENESS",
            ErrorKind::UniqueOriginal => "UNIQUE_ORIGINAL",
            ErrorKind::UniqueNew => "UNIQUE_NEW",
            ErrorKind::PrimaryRelation => "PRIMARY_RELATION",
            ErrorKind::SecondaryRelation => "SECONDARY_RELATION",
            ErrorKind::Surjection => "SURJECTION",
            ErrorKind::Structural => "STRUCTURAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a run validates a complete submission or a delta on top of a release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Full,
    Incremental,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Full => f.write_str("full"),
            ValidationMode::Incremental => f.write_str("incremental"),
        }
    }
}

/// One detected key violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub file_type: FileType,
    pub file_name: String,
    /// Physical line (header is line 1). `None` for surjection errors.
    pub line_number: Option<u64>,
    pub error_kind: ErrorKind,
    pub key: Option<Key>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_file_type: Option<FileType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationError {
    /// A row-level (or surjection) error on a key.
    pub fn for_key(
        error_kind: ErrorKind,
        file_type: FileType,
        file_name: impl Into<String>,
        line_number: Option<u64>,
        key: Key,
        field_names: &[String],
    ) -> Self {
        Self {
            file_type,
            file_name: file_name.into(),
            line_number,
            error_kind,
            key: Some(key),
            field_names: field_names.to_vec(),
            referenced_file_type: None,
            message: None,
        }
    }

    /// A fatal error about the shape of the submission.
    pub fn structural(
        file_type: FileType,
        file_name: impl Into<String>,
        line_number: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file_type,
            file_name: file_name.into(),
            line_number,
            error_kind: ErrorKind::Structural,
            key: None,
            field_names: Vec::new(),
            referenced_file_type: None,
            message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn with_referenced(mut self, file_type: FileType) -> Self {
        self.referenced_file_type = Some(file_type);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.error_kind, self.file_type)?;
        if !self.file_name.is_empty() {
            write!(f, " ({}", self.file_name)?;
            if let Some(line) = self.line_number {
                write!(f, ":{line}")?;
            }
            f.write_str(")")?;
        }
        if let Some(key) = &self.key {
            write!(f, " key {key}")?;
        }
        if let Some(referenced) = &self.referenced_file_type {
            write!(f, " -> {referenced}")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

/// Terminal result of one validation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub dictionary_fingerprint: String,
    pub mode: ValidationMode,
    pub errors: Vec<ValidationError>,
    /// Data rows streamed per file type, both sides included.
    #[serde(default)]
    pub rows_processed: BTreeMap<FileType, u64>,
}

impl ValidationReport {
    pub fn new(dictionary_fingerprint: impl Into<String>, mode: ValidationMode) -> Self {
        Self {
            dictionary_fingerprint: dictionary_fingerprint.into(),
            mode,
            errors: Vec::new(),
            rows_processed: BTreeMap::new(),
        }
    }

    /// A report holding only fatal errors.
    pub fn fatal(
        dictionary_fingerprint: impl Into<String>,
        mode: ValidationMode,
        errors: Vec<ValidationError>,
    ) -> Self {
        Self {
            errors,
            ..Self::new(dictionary_fingerprint, mode)
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        self.errors
            .iter()
            .filter(|error| error.error_kind == kind)
            .count()
    }

    /// Zero errors is the acceptance signal.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_fatal(&self) -> bool {
        self.errors.iter().any(|error| error.error_kind.is_fatal())
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total_errors: self.errors.len(),
            ..ReportSummary::default()
        };
        for error in &self.errors {
            *summary.by_kind.entry(error.error_kind).or_default() += 1;
            *summary
                .by_file_type
                .entry(error.file_type.clone())
                .or_default()
                .entry(error.error_kind)
                .or_default() += 1;
        }
        summary
    }
}

/// Error counts grouped by kind and by file type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_errors: usize,
    pub by_kind: BTreeMap<ErrorKind, usize>,
    pub by_file_type: BTreeMap<FileType, BTreeMap<ErrorKind, usize>>,
}
