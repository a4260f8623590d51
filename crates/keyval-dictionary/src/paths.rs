//! Dictionary directory path resolution.

use std::path::{Path, PathBuf};

/// Environment variable for overriding the dictionary directory.
pub const DICTIONARY_ENV_VAR: &str = "KEYVAL_DICTIONARY_DIR";

/// File name of the dictionary inside the dictionary directory.
pub const DICTIONARY_FILE: &str = "dictionary.json";

/// File name of an optional layout override inside the dictionary directory.
pub const LAYOUT_FILE: &str = "layout.toml";

/// Get the dictionary root directory.
///
/// Resolution order:
/// 1. `KEYVAL_DICTIONARY_DIR` environment variable
/// 2. `dictionary/` directory relative to workspace root
pub fn dictionary_root() -> PathBuf {
    if let Ok(root) = std::env::var(DICTIONARY_ENV_VAR) {
        return PathBuf::from(root);
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../dictionary")
}

pub fn dictionary_path(dir: &Path) -> PathBuf {
    dir.join(DICTIONARY_FILE)
}

pub fn layout_path(dir: &Path) -> PathBuf {
    dir.join(LAYOUT_FILE)
}
