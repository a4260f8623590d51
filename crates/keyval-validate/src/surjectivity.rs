//! Surjectivity: every parent key must be referenced by some child row.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, info_span};

use keyval_dictionary::FileTypeSchema;
use keyval_model::{ErrorKind, Key, ValidationError};

use crate::keys::{EncounteredForeignKeys, SideKeys};

/// How many child file types fed the accumulator of a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// A single child file type.
    Simple,
    /// Several sibling file types, merged before the check.
    Complex,
}

impl Topology {
    pub fn for_children(children: usize) -> Self {
        if children > 1 {
            Topology::Complex
        } else {
            Topology::Simple
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Simple => f.write_str("simple"),
            Topology::Complex => f.write_str("complex"),
        }
    }
}

/// Parent keys never seen as a foreign key, one error each, in key order.
///
/// Keys whose only references were deleted on purpose are not reported.
pub(crate) fn check_surjectivity(
    parent: &FileTypeSchema,
    keys: &SideKeys,
    encountered: Option<&EncounteredForeignKeys>,
    file_name: &str,
    topology: Topology,
) -> Vec<ValidationError> {
    let span = info_span!("surjectivity", parent = %parent.file_type, %topology);
    let _guard = span.enter();

    let Some(columns) = &parent.pk else {
        return Vec::new();
    };
    let missing: BTreeSet<&Key> = keys
        .live_keys()
        .filter(|key| encountered.is_none_or(|seen| seen.expects(key)))
        .collect();

    debug!(
        referenced = encountered.map_or(0, EncounteredForeignKeys::len),
        unreferenced = missing.len(),
        "surjectivity checked"
    );

    missing
        .into_iter()
        .map(|key| {
            ValidationError::for_key(
                ErrorKind::Surjection,
                parent.file_type.clone(),
                file_name,
                None,
                key.clone(),
                &columns.fields,
            )
        })
        .collect()
}
