//! Composite keys and the missing-code convention.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Submitter code for "not collected".
pub const MISSING_NOT_COLLECTED: &str = "-777";
/// Submitter code for "not applicable".
pub const MISSING_NOT_APPLICABLE: &str = "-888";
/// Submitter code for "unknown".
pub const MISSING_UNKNOWN: &str = "-999";

/// All codes a submitter may place in a field that accepts missing codes.
pub const MISSING_CODES: [&str; 3] = [
    MISSING_NOT_COLLECTED,
    MISSING_NOT_APPLICABLE,
    MISSING_UNKNOWN,
];

/// Returns true when `value` is one of the reserved missing codes.
pub fn is_missing_code(value: &str) -> bool {
    MISSING_CODES.contains(&value)
}

/// Returns true when a value of an optional key column means "no key here".
pub fn is_not_applicable(value: &str) -> bool {
    value.is_empty() || is_missing_code(value)
}

/// An ordered tuple of column values.
///
/// Ordering is lexicographic over the components, so keys sort the same way
/// regardless of which backing store holds them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(Vec<String>);

impl Key {
    pub fn new(values: Vec<String>) -> Result<Self, ModelError> {
        if values.is_empty() {
            return Err(ModelError::EmptyKey);
        }
        Ok(Self(values))
    }

    /// Build a key from string slices (tests and fixtures).
    pub fn of(values: &[&str]) -> Result<Self, ModelError> {
        Self::new(values.iter().map(|value| (*value).to_string()).collect())
    }

    /// Build an optional key.
    ///
    /// Yields `None` when any component is empty or a missing code. This is
    /// the single place where "key not applicable" is decided.
    pub fn optional<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut parts = Vec::new();
        for value in values {
            if is_not_applicable(value) {
                return None;
            }
            parts.push(value.to_string());
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self(parts))
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, value) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            f.write_str(value)?;
        }
        f.write_str("]")
    }
}

/// A decomposed row: the keys it carries, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tuple {
    pub pk: Option<Key>,
    pub fk1: Option<Key>,
    pub fk2: Option<Key>,
}
