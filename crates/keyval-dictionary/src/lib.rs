#![deny(unsafe_code)]

//! Submission dictionary and the key schema derived from it.
//!
//! The dictionary (JSON) is the single source of truth for which columns
//! form each file type's primary and foreign keys. The layout (TOML) only
//! fixes processing order: clinical spine, supplemental clinical files, and
//! experimental data types with their file types.
//!
//! # Example
//!
//! ```ignore
//! use keyval_dictionary::load_default_schema;
//!
//! let schema = load_default_schema()?;
//! for file_type in schema.processing_order() {
//!     println!("{file_type}");
//! }
//! ```

pub mod dictionary;
pub mod error;
pub mod hash;
pub mod layout;
pub mod loaders;
pub mod paths;
pub mod schema;

pub use crate::dictionary::{Dictionary, Field, FileSchema, Relation};
pub use crate::error::{DictionaryError, Result};
pub use crate::layout::Layout;
pub use crate::loaders::{
    default_dictionary_dir, default_layout, load_default_schema, load_dictionary, load_layout,
    load_schema, schema_from_json,
};
pub use crate::schema::{Branch, BranchFile, FileTypeSchema, KeyColumns, KeySchema, ParentRelation};
