//! Submission file ingestion.
//!
//! This crate finds the data file for each dictionary file type, streams
//! its rows without materializing the file, and parses the deletion file of
//! incremental submissions.
//!
//! # Features
//!
//! - **File Location**: Match dictionary patterns, flag ambiguous matches
//! - **Streaming Rows**: Tab-separated, optionally gzip-compressed
//! - **Deletion File**: Donors and feature types to remove
//!
//! # Example
//!
//! ```ignore
//! use keyval_ingest::{FileLocator, SubmissionRoots};
//!
//! let roots = SubmissionRoots::new("submissions/PROJ-1");
//! let located = FileLocator::new(&schema, &roots).locate()?;
//! ```

mod deletion;
mod error;
mod locator;
mod reader;

// === Error Types ===
pub use error::{IngestError, Result};

// === File Location ===
pub use locator::{
    AmbiguousMatch, FileLocator, LocatedFiles, Side, SubmissionRoots, file_name_of,
    list_data_files,
};

// === Row Streaming ===
pub use reader::{ReaderOptions, Row, TsvReader, is_gzip_path};

// === Deletion File ===
pub use deletion::{
    ALL_FEATURE_TYPES, DeletionData, DeletionEntry, DeletionProblem, DeletionScope,
    TO_BE_REMOVED_FILE_NAME,
};
