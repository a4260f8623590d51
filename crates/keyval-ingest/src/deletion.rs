//! The "to-be-removed" file of incremental submissions.
//!
//! Each row names a donor of the prior release and the feature types to drop
//! for it, either a comma-separated list of data types or `all`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use keyval_model::DataType;

use crate::error::Result;
use crate::reader::{ReaderOptions, TsvReader};

/// File name of the deletion marker in a submission directory.
pub const TO_BE_REMOVED_FILE_NAME: &str = "to_be_removed.txt";

/// Feature type token meaning "the whole donor".
pub const ALL_FEATURE_TYPES: &str = "all";

const EXPECTED_HEADER: [&str; 2] = ["donor_id", "feature_types"];
const EXPECTED_COLUMNS: usize = EXPECTED_HEADER.len();

/// What is removed for one donor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionScope {
    /// The donor and everything attached to it.
    All,
    /// Only rows of the listed data types.
    DataTypes(BTreeSet<DataType>),
}

impl DeletionScope {
    /// Clinical rows are only removed with the donor itself.
    pub fn covers_clinical(&self) -> bool {
        matches!(self, DeletionScope::All)
    }

    pub fn covers(&self, data_type: &DataType) -> bool {
        match self {
            DeletionScope::All => true,
            DeletionScope::DataTypes(types) => types.contains(data_type),
        }
    }
}

impl fmt::Display for DeletionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletionScope::All => f.write_str(ALL_FEATURE_TYPES),
            DeletionScope::DataTypes(types) => {
                let names: Vec<&str> = types.iter().map(DataType::as_str).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionEntry {
    pub line_number: u64,
    pub scope: DeletionScope,
}

/// A well-formedness problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionProblem {
    pub line_number: u64,
    pub message: String,
}

impl DeletionProblem {
    fn new(line_number: u64, message: impl Into<String>) -> Self {
        Self {
            line_number,
            message: message.into(),
        }
    }
}

/// Parsed deletion requests keyed by donor id.
#[derive(Debug, Clone, Default)]
pub struct DeletionData {
    entries: BTreeMap<String, DeletionEntry>,
}

impl DeletionData {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the file, collecting every well-formedness problem.
    ///
    /// Rows with problems are left out of the returned data.
    pub fn parse(path: &Path, known: &[DataType]) -> Result<(Self, Vec<DeletionProblem>)> {
        let mut reader = TsvReader::open(path, ReaderOptions::default())?;
        let mut data = Self::default();
        let mut problems = Vec::new();

        // Rows under an unexpected header cannot be trusted.
        if !reader.header().iter().map(String::as_str).eq(EXPECTED_HEADER) {
            problems.push(DeletionProblem::new(
                1,
                format!(
                    "expected header '{}', found '{}'",
                    EXPECTED_HEADER.join("\t"),
                    reader.header().join("\t")
                ),
            ));
            return Ok((data, problems));
        }

        while let Some(row) = reader.next_row()? {
            let line = row.line_number;
            if row.len() != EXPECTED_COLUMNS {
                problems.push(DeletionProblem::new(
                    line,
                    format!("expected {EXPECTED_COLUMNS} columns, found {}", row.len()),
                ));
                continue;
            }
            let donor_id = row.get(0).unwrap_or_default().to_string();
            let feature_types = row.get(1).unwrap_or_default();
            if donor_id.is_empty() {
                problems.push(DeletionProblem::new(line, "empty donor id"));
                continue;
            }
            if let Some(previous) = data.entries.get(&donor_id) {
                problems.push(DeletionProblem::new(
                    line,
                    format!(
                        "donor {donor_id} already listed on line {}",
                        previous.line_number
                    ),
                ));
                continue;
            }
            match parse_scope(feature_types, known) {
                Ok(scope) => {
                    data.entries.insert(
                        donor_id,
                        DeletionEntry {
                            line_number: line,
                            scope,
                        },
                    );
                }
                Err(message) => problems.push(DeletionProblem::new(line, message)),
            }
        }

        tracing::debug!(
            path = %path.display(),
            donors = data.entries.len(),
            problems = problems.len(),
            "parsed deletion file"
        );
        Ok((data, problems))
    }

    pub fn insert(&mut self, donor_id: impl Into<String>, entry: DeletionEntry) {
        self.entries.insert(donor_id.into(), entry);
    }

    pub fn donor_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entry(&self, donor_id: &str) -> Option<&DeletionEntry> {
        self.entries.get(donor_id)
    }

    pub fn scope(&self, donor_id: &str) -> Option<&DeletionScope> {
        self.entries.get(donor_id).map(|entry| &entry.scope)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_scope(value: &str, known: &[DataType]) -> std::result::Result<DeletionScope, String> {
    let tokens: Vec<&str> = value.split(',').map(str::trim).collect();
    if tokens.iter().any(|token| token.is_empty()) {
        return Err(format!("empty feature type in '{value}'"));
    }
    if tokens.iter().any(|token| token.eq_ignore_ascii_case(ALL_FEATURE_TYPES)) {
        if tokens.len() == 1 {
            return Ok(DeletionScope::All);
        }
        return Err(format!("'{ALL_FEATURE_TYPES}' must appear alone, found '{value}'"));
    }

    let mut types = BTreeSet::new();
    for token in tokens {
        let data_type =
            DataType::new(token).map_err(|_| format!("invalid feature type '{token}'"))?;
        if !known.contains(&data_type) {
            return Err(format!("unknown feature type '{token}'"));
        }
        if !types.insert(data_type) {
            return Err(format!("duplicate feature type '{token}'"));
        }
    }
    Ok(DeletionScope::DataTypes(types))
}
