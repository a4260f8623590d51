//! File discovery: which data file, if any, carries each file type.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use keyval_dictionary::{Branch, KeySchema};
use keyval_model::FileType;

use crate::deletion::TO_BE_REMOVED_FILE_NAME;
use crate::error::{IngestError, Result};

/// Which submission a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The previously accepted release.
    Original,
    /// The submission being validated.
    New,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Original => f.write_str("original"),
            Side::New => f.write_str("new"),
        }
    }
}

/// Directories a run reads from.
#[derive(Debug, Clone)]
pub struct SubmissionRoots {
    pub submission: PathBuf,
    /// Prior release, present for incremental runs.
    pub previous: Option<PathBuf>,
    /// Platform-provided files; falls back to `submission`.
    pub system: Option<PathBuf>,
}

impl SubmissionRoots {
    pub fn new(submission: impl Into<PathBuf>) -> Self {
        Self {
            submission: submission.into(),
            previous: None,
            system: None,
        }
    }

    #[must_use]
    pub fn with_previous(mut self, previous: Option<PathBuf>) -> Self {
        self.previous = previous;
        self
    }

    #[must_use]
    pub fn with_system(mut self, system: Option<PathBuf>) -> Self {
        self.system = system;
        self
    }

    pub fn is_incremental(&self) -> bool {
        self.previous.is_some()
    }
}

/// More than one file matched a single file type on one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousMatch {
    pub file_type: FileType,
    pub side: Side,
    pub paths: Vec<PathBuf>,
}

impl AmbiguousMatch {
    pub fn file_names(&self) -> Vec<String> {
        self.paths.iter().map(|path| file_name_of(path)).collect()
    }
}

/// Outcome of matching every scheduled file type against the directories.
#[derive(Debug, Clone, Default)]
pub struct LocatedFiles {
    files: BTreeMap<(FileType, Side), PathBuf>,
    ambiguous: Vec<AmbiguousMatch>,
    deletion_marker: Option<PathBuf>,
}

impl LocatedFiles {
    pub fn get(&self, file_type: &FileType, side: Side) -> Option<&Path> {
        self.files
            .get(&(file_type.clone(), side))
            .map(PathBuf::as_path)
    }

    pub fn contains(&self, file_type: &FileType, side: Side) -> bool {
        self.get(file_type, side).is_some()
    }

    pub fn ambiguous(&self) -> &[AmbiguousMatch] {
        &self.ambiguous
    }

    /// True when any file of the data type exists on `side`.
    pub fn has_data_type(&self, branch: &Branch, side: Side) -> bool {
        branch
            .files
            .iter()
            .filter(|file| !file.system)
            .any(|file| self.contains(&file.file_type, side))
    }

    /// The "to-be-removed" file of the new submission, if any.
    pub fn deletion_marker(&self) -> Option<&Path> {
        self.deletion_marker.as_deref()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Lists all regular files in a directory.
///
/// Returns files sorted by filename.
pub fn list_data_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Matches dictionary file patterns against submission directories.
pub struct FileLocator<'a> {
    schema: &'a KeySchema,
    roots: &'a SubmissionRoots,
}

impl<'a> FileLocator<'a> {
    pub fn new(schema: &'a KeySchema, roots: &'a SubmissionRoots) -> Self {
        Self { schema, roots }
    }

    /// Locate every file type the layout schedules, on every available side.
    pub fn locate(&self) -> Result<LocatedFiles> {
        let new_files = list_data_files(&self.roots.submission)?;
        let previous_files = match &self.roots.previous {
            Some(dir) => Some(list_data_files(dir)?),
            None => None,
        };
        let system_files = match &self.roots.system {
            Some(dir) => list_data_files(dir)?,
            None => new_files.clone(),
        };

        let mut located = LocatedFiles::default();
        let system_types: Vec<&FileType> = self
            .schema
            .branches()
            .iter()
            .flat_map(|branch| branch.files.iter())
            .filter(|file| file.system)
            .map(|file| &file.file_type)
            .collect();

        for file_type in self.schema.processing_order() {
            let is_system = system_types.contains(&file_type);
            let candidates = if is_system { &system_files } else { &new_files };
            self.match_into(&mut located, file_type, Side::New, candidates);
            if let Some(previous) = &previous_files {
                // System files are shared by both sides and only read once.
                if !is_system {
                    self.match_into(&mut located, file_type, Side::Original, previous);
                }
            }
        }

        located.deletion_marker = new_files
            .iter()
            .find(|path| file_name_of(path) == TO_BE_REMOVED_FILE_NAME)
            .cloned();

        tracing::debug!(
            submission = %self.roots.submission.display(),
            located = located.files.len(),
            ambiguous = located.ambiguous.len(),
            "located submission files"
        );
        Ok(located)
    }

    fn match_into(
        &self,
        located: &mut LocatedFiles,
        file_type: &FileType,
        side: Side,
        candidates: &[PathBuf],
    ) {
        let Some(schema) = self.schema.file_type(file_type) else {
            return;
        };
        let matches: Vec<PathBuf> = candidates
            .iter()
            .filter(|path| schema.matches(&file_name_of(path)))
            .cloned()
            .collect();
        match matches.len() {
            0 => {}
            1 => {
                if let Some(path) = matches.into_iter().next() {
                    tracing::debug!(file_type = %file_type, %side, path = %path.display(), "matched file");
                    located.files.insert((file_type.clone(), side), path);
                }
            }
            _ => located.ambiguous.push(AmbiguousMatch {
                file_type: file_type.clone(),
                side,
                paths: matches,
            }),
        }
    }
}

/// Final path component as text (lossy).
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
