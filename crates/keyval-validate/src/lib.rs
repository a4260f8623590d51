//! Key-set validation engine.
//!
//! Checks a submission's primary keys for uniqueness, its foreign keys for
//! existence in their parent file type, and surjective relations for parent
//! rows that no child references. Runs either on a complete submission or
//! on a delta on top of a previously accepted release.
//!
//! # Features
//!
//! - **Streaming**: Files are read row by row; only key sets stay in memory
//! - **Incremental Runs**: Old and new key sets, soft deletes via `to_be_removed.txt`
//! - **Pluggable Stores**: Hash or ordered [`KeyStore`] backends
//! - **Parallel Branches**: Experimental data types on rayon (`parallel` feature)
//! - **Cancellation**: [`CancelFlag`] checked between files and inside them
//!
//! # Example
//!
//! ```ignore
//! use keyval_dictionary::load_default_schema;
//! use keyval_ingest::SubmissionRoots;
//! use keyval_validate::{ValidateOptions, ValidationRequest, validate_submission};
//!
//! let schema = load_default_schema()?;
//! let request = ValidationRequest::new(&schema, SubmissionRoots::new("submissions/PROJ-1"));
//! let report = validate_submission(&request, &ValidateOptions::default())?;
//! println!("{} errors", report.error_count());
//! ```

mod deletion;
mod error;
mod file_validator;
mod keys;
mod options;
mod orchestrator;
mod plan;
mod store;
mod surjectivity;

// === Error Types ===
pub use error::{Result, ValidateError};

// === Engine ===
pub use orchestrator::{ValidationRequest, validate_submission};
pub use options::{CancelFlag, DEFAULT_PROGRESS_INTERVAL, ValidateOptions};

// === Key Sets ===
pub use keys::{EncounteredForeignKeys, SideKeys};
pub use store::{HashKeyStore, KeyStore, KeyStoreKind, OrderedKeyStore, PrimaryKeySet};
pub use surjectivity::Topology;

pub use deletion::DELETION_FILE_TYPE;
