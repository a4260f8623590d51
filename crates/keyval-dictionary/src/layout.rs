#![deny(unsafe_code)]

//! Processing layout: which file types run, in what order.

use serde::{Deserialize, Serialize};

/// Layout bundled with the crate, used when a dictionary directory has none.
pub const DEFAULT_LAYOUT: &str = include_str!("../layout/default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    pub spine: Vec<String>,
    #[serde(default)]
    pub supplemental: Vec<String>,
    #[serde(default)]
    pub data_types: Vec<DataTypeLayout>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTypeLayout {
    pub name: String,
    pub files: Vec<LayoutFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutFile {
    pub file_type: String,
    /// Must be present whenever any file of the data type is present.
    #[serde(default)]
    pub required: bool,
    /// Provided by the platform rather than the submitter.
    #[serde(default)]
    pub system: bool,
}

impl Layout {
    /// Every file type named by the layout, in processing order.
    pub fn ordered_file_types(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.spine.iter().map(String::as_str).collect();
        out.extend(self.supplemental.iter().map(String::as_str));
        for data_type in &self.data_types {
            out.extend(data_type.files.iter().map(|file| file.file_type.as_str()));
        }
        out
    }
}

impl std::str::FromStr for Layout {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}
