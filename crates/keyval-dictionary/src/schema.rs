#![deny(unsafe_code)]

//! Key schema derived once from the dictionary and the layout.
//!
//! Column positions are resolved from field names here and nowhere else. A
//! foreign key's columns are reordered to follow the parent's primary key so
//! that both sides build comparable [`Key`](keyval_model::Key) values.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use keyval_model::{DataType, FileType};

use crate::dictionary::{Dictionary, Field, FileSchema, Relation};
use crate::error::{DictionaryError, Result};
use crate::layout::Layout;

/// Ordered column positions of a key, with the field names they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumns {
    pub fields: Vec<String>,
    pub indices: Vec<usize>,
}

/// A foreign key into a parent file type.
#[derive(Debug, Clone)]
pub struct ParentRelation {
    pub parent: FileType,
    pub columns: KeyColumns,
    /// Values may be missing codes, in which case the key is not applicable.
    pub optional: bool,
}

/// Everything the validator needs to know about one file type.
#[derive(Debug, Clone)]
pub struct FileTypeSchema {
    pub file_type: FileType,
    /// Dictionary pattern wrapped in anchors.
    pub pattern: Regex,
    pub field_names: Vec<String>,
    pub pk: Option<KeyColumns>,
    pub fk1: Option<ParentRelation>,
    pub fk2: Option<ParentRelation>,
    /// Every FK1 parent row must be referenced by some row of this type.
    pub surjective: bool,
}

impl FileTypeSchema {
    /// Whole-name match against the dictionary pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.is_match(file_name)
    }

    pub fn arity(&self) -> usize {
        self.field_names.len()
    }

    /// Parent whose surjectivity this file type feeds, if any.
    pub fn surjective_parent(&self) -> Option<&FileType> {
        if self.surjective {
            self.fk1.as_ref().map(|relation| &relation.parent)
        } else {
            None
        }
    }

    /// True when FK2 values count toward the surjective parent as well.
    pub fn fk2_feeds_surjection(&self) -> bool {
        match (self.surjective_parent(), &self.fk2) {
            (Some(parent), Some(fk2)) => &fk2.parent == parent,
            _ => false,
        }
    }

    pub fn parents(&self) -> impl Iterator<Item = &FileType> {
        self.fk1
            .iter()
            .chain(self.fk2.iter())
            .map(|relation| &relation.parent)
    }
}

/// A file type's place inside an experimental data type.
#[derive(Debug, Clone)]
pub struct BranchFile {
    pub file_type: FileType,
    pub required: bool,
    pub system: bool,
}

/// One experimental data type and its file types in processing order.
#[derive(Debug, Clone)]
pub struct Branch {
    pub data_type: DataType,
    pub files: Vec<BranchFile>,
}

impl Branch {
    pub fn file_types(&self) -> impl Iterator<Item = &FileType> {
        self.files.iter().map(|file| &file.file_type)
    }
}

/// Immutable schema for one dictionary version.
#[derive(Debug, Clone)]
pub struct KeySchema {
    version: String,
    fingerprint: String,
    file_types: BTreeMap<FileType, FileTypeSchema>,
    spine: Vec<FileType>,
    supplemental: Vec<FileType>,
    branches: Vec<Branch>,
}

impl KeySchema {
    pub fn build(dictionary: &Dictionary, layout: &Layout, fingerprint: String) -> Result<Self> {
        let mut by_name: BTreeMap<&str, &FileSchema> = BTreeMap::new();
        for file in &dictionary.files {
            if by_name.insert(file.name.as_str(), file).is_some() {
                return Err(DictionaryError::DuplicateFileType {
                    file_type: file.name.clone(),
                });
            }
        }

        let mut file_types = BTreeMap::new();
        for file in &dictionary.files {
            let schema = build_file_type(file, &by_name)?;
            file_types.insert(schema.file_type.clone(), schema);
        }

        let (spine, supplemental, branches) = resolve_layout(layout)?;
        let schema = Self {
            version: dictionary.version.clone(),
            fingerprint,
            file_types,
            spine,
            supplemental,
            branches,
        };
        schema.check_layout_order()?;
        Ok(schema)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// SHA-256 of the dictionary bytes this schema was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn file_type(&self, file_type: &FileType) -> Option<&FileTypeSchema> {
        self.file_types.get(file_type)
    }

    pub fn file_types(&self) -> impl Iterator<Item = &FileTypeSchema> {
        self.file_types.values()
    }

    pub fn spine(&self) -> &[FileType] {
        &self.spine
    }

    pub fn supplemental(&self) -> &[FileType] {
        &self.supplemental
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branch(&self, data_type: &DataType) -> Option<&Branch> {
        self.branches
            .iter()
            .find(|branch| &branch.data_type == data_type)
    }

    pub fn data_types(&self) -> impl Iterator<Item = &DataType> {
        self.branches.iter().map(|branch| &branch.data_type)
    }

    /// Data type owning a file type, `None` for clinical file types.
    pub fn data_type_of(&self, file_type: &FileType) -> Option<&DataType> {
        self.branches
            .iter()
            .find(|branch| branch.file_types().any(|candidate| candidate == file_type))
            .map(|branch| &branch.data_type)
    }

    /// Platform-provided file types (e.g. probe annotations).
    pub fn is_system(&self, file_type: &FileType) -> bool {
        self.branches
            .iter()
            .flat_map(|branch| &branch.files)
            .any(|file| file.system && &file.file_type == file_type)
    }

    pub fn is_spine(&self, file_type: &FileType) -> bool {
        self.spine.contains(file_type)
    }

    /// Spine, then supplemental, then every branch in layout order.
    pub fn processing_order(&self) -> Vec<&FileType> {
        let mut out: Vec<&FileType> = self.spine.iter().collect();
        out.extend(self.supplemental.iter());
        for branch in &self.branches {
            out.extend(branch.file_types());
        }
        out
    }

    fn check_layout_order(&self) -> Result<()> {
        let mut seen: BTreeSet<&FileType> = BTreeSet::new();
        for file_type in self.processing_order() {
            let Some(schema) = self.file_types.get(file_type) else {
                return Err(DictionaryError::UnknownFileType {
                    file_type: file_type.to_string(),
                    referenced_by: "layout".to_string(),
                });
            };
            if !seen.insert(file_type) {
                return Err(DictionaryError::layout(format!(
                    "{file_type} is listed more than once"
                )));
            }
            for parent in schema.parents() {
                if !seen.contains(parent) {
                    return Err(DictionaryError::layout(format!(
                        "{file_type} is processed before its parent {parent}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn build_file_type(
    file: &FileSchema,
    by_name: &BTreeMap<&str, &FileSchema>,
) -> Result<FileTypeSchema> {
    let file_type = FileType::new(file.name.clone())?;
    let pattern = Regex::new(&format!("^(?:{})$", file.pattern)).map_err(|source| {
        DictionaryError::Pattern {
            file_type: file.name.clone(),
            source,
        }
    })?;

    let pk = if file.unique_fields.is_empty() {
        None
    } else {
        Some(resolve_columns(file, &file.unique_fields)?)
    };

    if file.relations.len() > 2 {
        return Err(DictionaryError::relation(
            &file.name,
            format!("{} relations declared, at most 2 supported", file.relations.len()),
        ));
    }
    let mut relations = file.relations.iter();
    let fk1 = relations
        .next()
        .map(|relation| build_relation(file, relation, by_name))
        .transpose()?;
    let fk2 = relations
        .next()
        .map(|relation| build_relation(file, relation, by_name))
        .transpose()?;
    let surjective = file
        .relations
        .first()
        .is_some_and(|relation| relation.bidirectional);

    Ok(FileTypeSchema {
        file_type,
        pattern,
        field_names: file.field_names(),
        pk,
        fk1,
        fk2,
        surjective,
    })
}

fn build_relation(
    file: &FileSchema,
    relation: &Relation,
    by_name: &BTreeMap<&str, &FileSchema>,
) -> Result<ParentRelation> {
    let Some(parent) = by_name.get(relation.other.as_str()) else {
        return Err(DictionaryError::UnknownFileType {
            file_type: relation.other.clone(),
            referenced_by: file.name.clone(),
        });
    };
    if relation.fields.len() != relation.other_fields.len() {
        return Err(DictionaryError::relation(
            &file.name,
            format!(
                "{} fields map onto {} fields of {}",
                relation.fields.len(),
                relation.other_fields.len(),
                parent.name
            ),
        ));
    }
    if parent.unique_fields.is_empty() {
        return Err(DictionaryError::relation(
            &file.name,
            format!("parent {} declares no unique fields", parent.name),
        ));
    }
    let same_fields = parent.unique_fields.len() == relation.other_fields.len()
        && parent
            .unique_fields
            .iter()
            .all(|field| relation.other_fields.contains(field));
    if !same_fields {
        return Err(DictionaryError::relation(
            &file.name,
            format!(
                "{:?} does not match the unique fields {:?} of {}",
                relation.other_fields, parent.unique_fields, parent.name
            ),
        ));
    }

    // Reorder child columns to follow the parent's primary key order.
    let mut ordered = Vec::with_capacity(parent.unique_fields.len());
    for parent_field in &parent.unique_fields {
        let position = relation
            .other_fields
            .iter()
            .position(|field| field == parent_field)
            .ok_or_else(|| DictionaryError::relation(&file.name, "unmatched parent field"))?;
        ordered.push(relation.fields[position].clone());
    }
    let columns = resolve_columns(file, &ordered)?;

    let mut optional = false;
    for (position, field_name) in relation.fields.iter().enumerate() {
        if relation.optionals.contains(&position) {
            optional = true;
        }
        if file
            .field(field_name)
            .is_some_and(Field::accepts_missing_code)
        {
            optional = true;
        }
    }

    Ok(ParentRelation {
        parent: FileType::new(parent.name.clone())?,
        columns,
        optional,
    })
}

fn resolve_columns(file: &FileSchema, names: &[String]) -> Result<KeyColumns> {
    let mut indices = Vec::with_capacity(names.len());
    for name in names {
        let index = file
            .field_index(name)
            .ok_or_else(|| DictionaryError::UnknownField {
                file_type: file.name.clone(),
                field: name.clone(),
            })?;
        indices.push(index);
    }
    Ok(KeyColumns {
        fields: names.to_vec(),
        indices,
    })
}

fn resolve_layout(layout: &Layout) -> Result<(Vec<FileType>, Vec<FileType>, Vec<Branch>)> {
    if layout.spine.is_empty() {
        return Err(DictionaryError::layout("spine is empty"));
    }
    let spine = layout
        .spine
        .iter()
        .map(|name| FileType::new(name.clone()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let supplemental = layout
        .supplemental
        .iter()
        .map(|name| FileType::new(name.clone()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut branches = Vec::with_capacity(layout.data_types.len());
    let mut names = BTreeSet::new();
    for data_type in &layout.data_types {
        if !names.insert(data_type.name.as_str()) {
            return Err(DictionaryError::layout(format!(
                "data type {} is listed more than once",
                data_type.name
            )));
        }
        if data_type.files.is_empty() {
            return Err(DictionaryError::layout(format!(
                "data type {} has no files",
                data_type.name
            )));
        }
        let mut files = Vec::with_capacity(data_type.files.len());
        for file in &data_type.files {
            files.push(BranchFile {
                file_type: FileType::new(file.file_type.clone())?,
                required: file.required,
                system: file.system,
            });
        }
        branches.push(Branch {
            data_type: DataType::new(data_type.name.clone())?,
            files,
        });
    }
    Ok((spine, supplemental, branches))
}
