//! Backing stores for primary key sets.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use keyval_model::{FileType, Key};

/// Set of keys behind a primary key set.
///
/// Implementations only need set semantics; callers never rely on
/// iteration order.
pub trait KeyStore: fmt::Debug + Send + Sync {
    /// Insert a key, returning true when it was not present.
    fn insert(&mut self, key: Key) -> bool;

    fn contains(&self, key: &Key) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Key> + '_>;
}

/// Hash set store. Fastest lookups, default.
#[derive(Debug, Default)]
pub struct HashKeyStore {
    keys: HashSet<Key>,
}

impl KeyStore for HashKeyStore {
    fn insert(&mut self, key: Key) -> bool {
        self.keys.insert(key)
    }

    fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Key> + '_> {
        Box::new(self.keys.iter())
    }
}

/// Ordered store; iterates keys in ascending order.
#[derive(Debug, Default)]
pub struct OrderedKeyStore {
    keys: BTreeSet<Key>,
}

impl KeyStore for OrderedKeyStore {
    fn insert(&mut self, key: Key) -> bool {
        self.keys.insert(key)
    }

    fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Key> + '_> {
        Box::new(self.keys.iter())
    }
}

/// Store selection for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStoreKind {
    #[default]
    Hash,
    Ordered,
}

impl KeyStoreKind {
    pub fn create(self) -> Box<dyn KeyStore> {
        match self {
            KeyStoreKind::Hash => Box::<HashKeyStore>::default(),
            KeyStoreKind::Ordered => Box::<OrderedKeyStore>::default(),
        }
    }
}

/// Primary keys seen so far for one file type on one side.
#[derive(Debug)]
pub struct PrimaryKeySet {
    file_type: FileType,
    store: Box<dyn KeyStore>,
}

impl PrimaryKeySet {
    pub fn new(file_type: FileType, kind: KeyStoreKind) -> Self {
        Self {
            file_type,
            store: kind.create(),
        }
    }

    pub fn file_type(&self) -> &FileType {
        &self.file_type
    }

    /// Insert a key, returning true when it was not present.
    pub fn insert(&mut self, key: Key) -> bool {
        self.store.insert(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.store.contains(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.store.iter()
    }
}
