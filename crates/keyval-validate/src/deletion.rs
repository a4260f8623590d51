//! Deletion file handling for incremental runs.

use tracing::{debug, warn};

use keyval_dictionary::KeySchema;
use keyval_ingest::{DeletionData, LocatedFiles, TO_BE_REMOVED_FILE_NAME};
use keyval_model::{DataType, FileType, Key, ValidationError, ValidationMode};

use crate::error::{Result, ValidateError};
use crate::keys::SideKeys;

/// File type reported on deletion file problems.
pub const DELETION_FILE_TYPE: &str = "to_be_removed";

fn deletion_file_type() -> Result<FileType> {
    Ok(FileType::new(DELETION_FILE_TYPE)?)
}

/// Parse the deletion file of the new submission.
///
/// Full runs ignore it. Well-formedness problems come back as structural
/// errors next to whatever rows parsed cleanly.
pub(crate) fn load_deletions(
    schema: &KeySchema,
    located: &LocatedFiles,
    mode: ValidationMode,
) -> Result<(DeletionData, Vec<ValidationError>)> {
    let Some(path) = located.deletion_marker() else {
        return Ok((DeletionData::empty(), Vec::new()));
    };
    if mode == ValidationMode::Full {
        warn!(path = %path.display(), "deletion file ignored outside incremental runs");
        return Ok((DeletionData::empty(), Vec::new()));
    }

    let known: Vec<DataType> = schema.data_types().cloned().collect();
    let file_type = deletion_file_type()?;
    match DeletionData::parse(path, &known) {
        Ok((data, problems)) => {
            let errors = problems
                .into_iter()
                .map(|problem| {
                    ValidationError::structural(
                        file_type.clone(),
                        TO_BE_REMOVED_FILE_NAME,
                        Some(problem.line_number),
                        problem.message,
                    )
                })
                .collect();
            debug!(donors = data.len(), "deletion file loaded");
            Ok((data, errors))
        }
        Err(err) if err.is_malformed() => {
            let error = ValidationError::structural(
                file_type,
                TO_BE_REMOVED_FILE_NAME,
                err.line(),
                err.to_string(),
            );
            Ok((DeletionData::empty(), vec![error]))
        }
        Err(err) => Err(ValidateError::Ingest(err)),
    }
}

/// Listed donors must exist in the prior release and must not be
/// resubmitted in the delta.
pub(crate) fn check_listed_donors(
    deletions: &DeletionData,
    donors: &SideKeys,
) -> Result<Vec<ValidationError>> {
    let mut errors = Vec::new();
    if deletions.is_empty() {
        return Ok(errors);
    }
    let file_type = deletion_file_type()?;
    for donor_id in deletions.donor_ids() {
        let line = deletions.entry(donor_id).map(|entry| entry.line_number);
        let key = Key::new(vec![donor_id.to_string()])?;
        let problem = if !donors.existed_in_original(&key) {
            Some(format!(
                "donor {donor_id} is listed for removal but not in the prior release"
            ))
        } else if donors.new_keys().contains(&key) {
            Some(format!(
                "donor {donor_id} is listed for removal and also submitted"
            ))
        } else {
            None
        };
        if let Some(message) = problem {
            let mut error =
                ValidationError::structural(file_type.clone(), TO_BE_REMOVED_FILE_NAME, line, message);
            error.key = Some(key);
            errors.push(error);
        }
    }
    Ok(errors)
}
