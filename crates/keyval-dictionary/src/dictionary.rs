#![deny(unsafe_code)]

//! Serde model of the submission dictionary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dictionary {
    pub version: String,
    pub files: Vec<FileSchema>,
}

impl Dictionary {
    pub fn file(&self, name: &str) -> Option<&FileSchema> {
        self.files.iter().find(|file| file.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSchema {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub pattern: String,
    #[serde(default)]
    pub unique_fields: Vec<String>,
    pub fields: Vec<Field>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl FileSchema {
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name.clone()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
}

impl Field {
    /// True when a `required` restriction allows submitter missing codes.
    pub fn accepts_missing_code(&self) -> bool {
        self.restrictions
            .iter()
            .any(|restriction| restriction.kind == "required" && restriction.config.accept_missing_code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restriction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub config: RestrictionConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionConfig {
    #[serde(default)]
    pub accept_missing_code: bool,
}

/// A foreign key declared on a file schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub fields: Vec<String>,
    pub other: String,
    pub other_fields: Vec<String>,
    /// Every parent row must be referenced by this file type.
    #[serde(default)]
    pub bidirectional: bool,
    /// Indices into `fields` whose values may be absent.
    #[serde(default)]
    pub optionals: Vec<usize>,
}
