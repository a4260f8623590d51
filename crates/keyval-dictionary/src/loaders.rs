#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use crate::dictionary::Dictionary;
use crate::error::{DictionaryError, Result};
use crate::hash::sha256_hex;
use crate::layout::{DEFAULT_LAYOUT, Layout};
use crate::paths::{dictionary_path, dictionary_root, layout_path};
use crate::schema::KeySchema;

/// Read a dictionary file and fingerprint its bytes.
pub fn load_dictionary(path: &Path) -> Result<(Dictionary, String)> {
    let bytes = std::fs::read(path).map_err(|e| DictionaryError::io(path, e))?;
    let dictionary = parse_dictionary(&bytes, path)?;
    Ok((dictionary, sha256_hex(&bytes)))
}

pub fn parse_dictionary(bytes: &[u8], path: &Path) -> Result<Dictionary> {
    serde_json::from_slice(bytes).map_err(|e| DictionaryError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn load_layout(path: &Path) -> Result<Layout> {
    let contents = std::fs::read_to_string(path).map_err(|e| DictionaryError::io(path, e))?;
    parse_layout(&contents, path)
}

/// The layout bundled with this crate.
pub fn default_layout() -> Result<Layout> {
    parse_layout(DEFAULT_LAYOUT, Path::new("<bundled layout>"))
}

fn parse_layout(contents: &str, path: &Path) -> Result<Layout> {
    toml::from_str(contents).map_err(|e| DictionaryError::Toml {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load `dictionary.json` (and `layout.toml` when present) from `dir`.
pub fn load_schema(dir: &Path) -> Result<KeySchema> {
    let (dictionary, fingerprint) = load_dictionary(&dictionary_path(dir))?;
    let layout_file = layout_path(dir);
    let layout = if layout_file.is_file() {
        load_layout(&layout_file)?
    } else {
        default_layout()?
    };
    KeySchema::build(&dictionary, &layout, fingerprint)
}

/// Build a schema from in-memory dictionary JSON and a layout.
pub fn schema_from_json(json: &str, layout: &Layout) -> Result<KeySchema> {
    let dictionary = parse_dictionary(json.as_bytes(), Path::new("<inline dictionary>"))?;
    KeySchema::build(&dictionary, layout, sha256_hex(json.as_bytes()))
}

/// Load the schema from the default dictionary directory.
pub fn load_default_schema() -> Result<KeySchema> {
    load_schema(&dictionary_root())
}

/// Directory a schema would be loaded from when none is given.
pub fn default_dictionary_dir() -> PathBuf {
    dictionary_root()
}
