//! Key bookkeeping for a run.

use std::collections::{BTreeMap, HashMap, HashSet};

use keyval_model::{FileType, Key, ValidationMode};

use crate::store::{KeyStoreKind, PrimaryKeySet};

/// Primary keys of one file type across both submission sides.
#[derive(Debug)]
pub struct SideKeys {
    file_type: FileType,
    /// Keys of the prior release, without soft-deleted ones.
    original: Option<PrimaryKeySet>,
    /// Keys of the submission being validated.
    new: PrimaryKeySet,
    /// Prior-release keys removed by the deletion file.
    suppressed: HashSet<Key>,
    /// Donor id per key, kept for clinical spine types of the prior release.
    lineage: Option<HashMap<Key, String>>,
}

impl SideKeys {
    pub fn new(file_type: FileType, mode: ValidationMode, kind: KeyStoreKind) -> Self {
        let original = match mode {
            ValidationMode::Full => None,
            ValidationMode::Incremental => Some(PrimaryKeySet::new(file_type.clone(), kind)),
        };
        Self {
            new: PrimaryKeySet::new(file_type.clone(), kind),
            file_type,
            original,
            suppressed: HashSet::new(),
            lineage: None,
        }
    }

    pub fn file_type(&self) -> &FileType {
        &self.file_type
    }

    pub fn original(&self) -> Option<&PrimaryKeySet> {
        self.original.as_ref()
    }

    pub fn original_mut(&mut self) -> Option<&mut PrimaryKeySet> {
        self.original.as_mut()
    }

    pub fn new_keys(&self) -> &PrimaryKeySet {
        &self.new
    }

    pub fn new_keys_mut(&mut self) -> &mut PrimaryKeySet {
        &mut self.new
    }

    /// True when either side holds the key. Suppressed keys do not count.
    pub fn contains(&self, key: &Key) -> bool {
        self.new.contains(key) || self.original.as_ref().is_some_and(|set| set.contains(key))
    }

    pub fn in_original(&self, key: &Key) -> bool {
        self.original.as_ref().is_some_and(|set| set.contains(key))
    }

    pub fn suppress(&mut self, key: Key) {
        self.suppressed.insert(key);
    }

    pub fn is_suppressed(&self, key: &Key) -> bool {
        self.suppressed.contains(key)
    }

    /// True when the prior release carried the key, deleted or not.
    pub fn existed_in_original(&self, key: &Key) -> bool {
        self.in_original(key) || self.is_suppressed(key)
    }

    pub fn enable_lineage(&mut self) {
        self.lineage.get_or_insert_with(HashMap::new);
    }

    pub fn record_lineage(&mut self, key: Key, donor_id: String) {
        if let Some(lineage) = &mut self.lineage {
            lineage.insert(key, donor_id);
        }
    }

    /// Donor owning a prior-release key, when lineage is tracked.
    pub fn donor_of(&self, key: &Key) -> Option<&str> {
        self.lineage
            .as_ref()
            .and_then(|lineage| lineage.get(key))
            .map(String::as_str)
    }

    pub fn tracks_lineage(&self) -> bool {
        self.lineage.is_some()
    }

    /// Every live key, both sides, each once.
    pub fn live_keys(&self) -> impl Iterator<Item = &Key> {
        let original = self.original.iter().flat_map(PrimaryKeySet::iter);
        original.chain(
            self.new
                .iter()
                .filter(|key| !self.in_original(key)),
        )
    }
}

/// Foreign keys seen while processing the children of one parent type.
///
/// Parent keys referenced only by rows removed through the deletion file
/// are held apart as excused: nothing refers to them any more, but on
/// purpose.
#[derive(Debug, Clone)]
pub struct EncounteredForeignKeys {
    parent: FileType,
    keys: HashSet<Key>,
    excused: HashSet<Key>,
}

impl EncounteredForeignKeys {
    pub fn new(parent: FileType) -> Self {
        Self {
            parent,
            keys: HashSet::new(),
            excused: HashSet::new(),
        }
    }

    pub fn parent(&self) -> &FileType {
        &self.parent
    }

    pub fn record(&mut self, key: Key) {
        self.keys.insert(key);
    }

    /// Record a reference carried by a deleted row.
    pub fn excuse(&mut self, key: Key) {
        self.excused.insert(key);
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    /// True when the parent key still needs a live reference.
    pub fn expects(&self, key: &Key) -> bool {
        !self.keys.contains(key) && !self.excused.contains(key)
    }

    /// Fold in keys gathered by another branch for the same parent.
    pub fn merge(&mut self, other: EncounteredForeignKeys) {
        if self.keys.is_empty() {
            self.keys = other.keys;
        } else {
            self.keys.extend(other.keys);
        }
        self.excused.extend(other.excused);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Read access to completed key sets: those of the current stage first,
/// then those shared from earlier stages.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeyLookup<'a> {
    pub local: &'a BTreeMap<FileType, SideKeys>,
    pub shared: Option<&'a BTreeMap<FileType, SideKeys>>,
}

impl<'a> KeyLookup<'a> {
    pub fn get(&self, file_type: &FileType) -> Option<&'a SideKeys> {
        self.local
            .get(file_type)
            .or_else(|| self.shared.and_then(|shared| shared.get(file_type)))
    }
}
