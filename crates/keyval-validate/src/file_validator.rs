//! Streaming per-file validation.
//!
//! One routine serves every file type: the schema says which columns form
//! the primary key and the foreign keys, and which parent each foreign key
//! points at. Rows are decoded into a [`Tuple`] and checked against the key
//! sets completed by earlier file types.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, info_span};

use keyval_dictionary::{FileTypeSchema, KeySchema, ParentRelation};
use keyval_ingest::{DeletionData, IngestError, ReaderOptions, Row, Side, TsvReader, file_name_of};
use keyval_model::{DataType, ErrorKind, FileType, Key, Tuple, ValidationError, ValidationMode};

use crate::error::ValidateError;
use crate::keys::{EncounteredForeignKeys, KeyLookup, SideKeys};
use crate::options::{CANCEL_CHECK_INTERVAL, ValidateOptions};

/// Why a file pass stopped early.
#[derive(Debug)]
pub(crate) enum FileAbort {
    /// The submission cannot be processed; becomes a fatal report.
    Structural(ValidationError),
    /// I/O failure or cancellation; becomes an `Err`.
    Failed(ValidateError),
}

impl From<ValidateError> for FileAbort {
    fn from(err: ValidateError) -> Self {
        FileAbort::Failed(err)
    }
}

/// Inputs shared by every file pass of a run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunContext<'a> {
    pub schema: &'a KeySchema,
    pub mode: ValidationMode,
    pub options: &'a ValidateOptions,
    pub deletions: &'a DeletionData,
}

/// Key sets, accumulators and findings owned by one stage of a run.
#[derive(Debug, Default)]
pub(crate) struct StageState {
    pub keys: BTreeMap<FileType, SideKeys>,
    pub encountered: BTreeMap<FileType, EncounteredForeignKeys>,
    pub errors: Vec<ValidationError>,
    pub rows: BTreeMap<FileType, u64>,
}

/// The files carrying one file type, per side.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FilePaths<'a> {
    pub original: Option<&'a Path>,
    pub new: Option<&'a Path>,
}

/// Load the prior release, then validate the new file, of one file type.
///
/// The resulting key set is stored in `stage.keys` even when neither file
/// exists, so children see an empty parent.
pub(crate) fn process_file_type(
    ctx: &RunContext<'_>,
    file: &FileTypeSchema,
    paths: FilePaths<'_>,
    shared: Option<&BTreeMap<FileType, SideKeys>>,
    stage: &mut StageState,
) -> Result<(), FileAbort> {
    let mut own = SideKeys::new(file.file_type.clone(), ctx.mode, ctx.options.store);
    if ctx.schema.is_spine(&file.file_type) {
        own.enable_lineage();
    }
    let data_type = ctx.schema.data_type_of(&file.file_type);

    let lookup = KeyLookup {
        local: &stage.keys,
        shared,
    };
    let mut encountered = file.surjective_parent().map(|parent| {
        stage
            .encountered
            .entry(parent.clone())
            .or_insert_with(|| EncounteredForeignKeys::new(parent.clone()))
    });

    let mut rows = 0;
    if let Some(path) = paths.original {
        rows += load_original(
            ctx,
            file,
            data_type,
            path,
            lookup,
            &mut own,
            encountered.as_deref_mut(),
        )?;
    }
    if let Some(path) = paths.new {
        rows += validate_new(
            ctx,
            file,
            path,
            lookup,
            &mut own,
            encountered,
            &mut stage.errors,
        )?;
    }

    if paths.original.is_some() || paths.new.is_some() {
        *stage.rows.entry(file.file_type.clone()).or_default() += rows;
    }
    stage.keys.insert(file.file_type.clone(), own);
    Ok(())
}

/// Stream a prior-release file into the original key set without reporting.
fn load_original(
    ctx: &RunContext<'_>,
    file: &FileTypeSchema,
    data_type: Option<&DataType>,
    path: &Path,
    lookup: KeyLookup<'_>,
    own: &mut SideKeys,
    mut encountered: Option<&mut EncounteredForeignKeys>,
) -> Result<u64, FileAbort> {
    let fk1_parent = file.fk1.as_ref().and_then(|relation| lookup.get(&relation.parent));
    let feeds_fk2 = file.fk2_feeds_surjection();
    let mut suppressed = 0u64;

    let rows = stream_file(ctx, file, path, Side::Original, |_, tuple| {
        let donor = donor_of_row(file, &tuple, fk1_parent);
        let parent_removed = match (&tuple.fk1, fk1_parent) {
            (Some(fk1), Some(parent)) => parent.is_suppressed(fk1),
            _ => false,
        };
        let donor_removed = donor.as_deref().is_some_and(|donor_id| {
            ctx.deletions
                .scope(donor_id)
                .is_some_and(|scope| match data_type {
                    Some(data_type) => scope.covers(data_type),
                    None => scope.covers_clinical(),
                })
        });

        if parent_removed || donor_removed {
            suppressed += 1;
            if let Some(accumulator) = encountered.as_deref_mut() {
                if let Some(fk1) = tuple.fk1 {
                    accumulator.excuse(fk1);
                }
                if feeds_fk2 && let Some(fk2) = tuple.fk2 {
                    accumulator.excuse(fk2);
                }
            }
            if let Some(pk) = tuple.pk {
                own.suppress(pk);
            }
            return;
        }

        if let Some(accumulator) = encountered.as_deref_mut() {
            if let Some(fk1) = &tuple.fk1 {
                accumulator.record(fk1.clone());
            }
            if feeds_fk2 && let Some(fk2) = &tuple.fk2 {
                accumulator.record(fk2.clone());
            }
        }
        if let Some(pk) = tuple.pk {
            if let Some(donor_id) = donor
                && own.tracks_lineage()
            {
                own.record_lineage(pk.clone(), donor_id);
            }
            if let Some(original) = own.original_mut() {
                original.insert(pk);
            }
        }
    })?;

    if suppressed > 0 {
        debug!(file_type = %file.file_type, suppressed, "suppressed deleted rows");
    }
    Ok(rows)
}

/// Donor owning an original row: the key itself for the spine root, else
/// inherited from the FK1 parent.
fn donor_of_row(
    file: &FileTypeSchema,
    tuple: &Tuple,
    fk1_parent: Option<&SideKeys>,
) -> Option<String> {
    match (&file.fk1, &tuple.fk1, fk1_parent) {
        (None, _, _) => tuple
            .pk
            .as_ref()
            .and_then(|pk| pk.values().first().cloned()),
        (Some(_), Some(fk1), Some(parent)) => parent.donor_of(fk1).map(str::to_string),
        _ => None,
    }
}

/// Stream a file of the submission under validation and report violations.
fn validate_new(
    ctx: &RunContext<'_>,
    file: &FileTypeSchema,
    path: &Path,
    lookup: KeyLookup<'_>,
    own: &mut SideKeys,
    mut encountered: Option<&mut EncounteredForeignKeys>,
    errors: &mut Vec<ValidationError>,
) -> Result<u64, FileAbort> {
    let file_name = file_name_of(path);
    let fk1_parent = file.fk1.as_ref().and_then(|relation| lookup.get(&relation.parent));
    let fk2_parent = file.fk2.as_ref().and_then(|relation| lookup.get(&relation.parent));
    let feeds_fk2 = file.fk2_feeds_surjection();
    let system = ctx.schema.is_system(&file.file_type);
    let before = errors.len();

    let rows = stream_file(ctx, file, path, Side::New, |line, tuple| {
        let Tuple { pk, fk1, fk2 } = tuple;

        // System files are not validated; their keys only serve children.
        if system {
            if let Some(pk) = pk {
                own.new_keys_mut().insert(pk);
            }
            return;
        }

        if let (Some(pk), Some(columns)) = (pk, &file.pk) {
            let kind = match ctx.mode {
                ValidationMode::Full => {
                    own.new_keys().contains(&pk).then_some(ErrorKind::Uniqueness)
                }
                ValidationMode::Incremental => {
                    if own.in_original(&pk) {
                        Some(ErrorKind::UniqueOriginal)
                    } else if own.new_keys().contains(&pk) {
                        Some(ErrorKind::UniqueNew)
                    } else {
                        None
                    }
                }
            };
            if let Some(kind) = kind {
                errors.push(ValidationError::for_key(
                    kind,
                    file.file_type.clone(),
                    file_name.clone(),
                    Some(line),
                    pk.clone(),
                    &columns.fields,
                ));
            }
            own.new_keys_mut().insert(pk);
        }

        if let (Some(fk1), Some(relation)) = (fk1, &file.fk1) {
            if !fk1_parent.is_some_and(|parent| parent.contains(&fk1)) {
                errors.push(relation_error(
                    ErrorKind::PrimaryRelation,
                    file,
                    &file_name,
                    line,
                    &fk1,
                    relation,
                ));
            }
            if let Some(accumulator) = encountered.as_deref_mut() {
                accumulator.record(fk1);
            }
        }

        if let (Some(fk2), Some(relation)) = (fk2, &file.fk2) {
            if !fk2_parent.is_some_and(|parent| parent.contains(&fk2)) {
                errors.push(relation_error(
                    ErrorKind::SecondaryRelation,
                    file,
                    &file_name,
                    line,
                    &fk2,
                    relation,
                ));
            }
            if feeds_fk2 && let Some(accumulator) = encountered.as_deref_mut() {
                accumulator.record(fk2);
            }
        }
    })?;

    let found = errors.len() - before;
    if found > 0 {
        debug!(file_type = %file.file_type, errors = found, "row errors");
    }
    Ok(rows)
}

fn relation_error(
    kind: ErrorKind,
    file: &FileTypeSchema,
    file_name: &str,
    line: u64,
    key: &Key,
    relation: &ParentRelation,
) -> ValidationError {
    ValidationError::for_key(
        kind,
        file.file_type.clone(),
        file_name,
        Some(line),
        key.clone(),
        &relation.columns.fields,
    )
    .with_referenced(relation.parent.clone())
}

/// Open a file, check its shape, and hand each decoded row to `on_row`.
///
/// Returns the number of data rows read.
fn stream_file<F>(
    ctx: &RunContext<'_>,
    file: &FileTypeSchema,
    path: &Path,
    side: Side,
    mut on_row: F,
) -> Result<u64, FileAbort>
where
    F: FnMut(u64, Tuple),
{
    let span = info_span!("file_type", name = %file.file_type, %side);
    let _guard = span.enter();
    let started = Instant::now();
    let file_name = file_name_of(path);
    let abort = |err: IngestError| ingest_abort(file, &file_name, err);

    let mut reader = TsvReader::open(path, ReaderOptions::default()).map_err(abort)?;
    if reader.header() != file.field_names.as_slice() {
        return Err(FileAbort::Structural(ValidationError::structural(
            file.file_type.clone(),
            file_name.clone(),
            Some(1),
            format!(
                "header does not match dictionary fields: expected [{}], found [{}]",
                file.field_names.join(", "),
                reader.header().join(", ")
            ),
        )));
    }

    let arity = file.arity();
    let progress_interval = ctx.options.progress_interval;
    let mut rows = 0u64;
    while let Some(row) = reader.next_row().map_err(abort)? {
        rows += 1;
        if row.len() != arity {
            return Err(FileAbort::Structural(ValidationError::structural(
                file.file_type.clone(),
                file_name.clone(),
                Some(row.line_number),
                format!("expected {arity} fields, found {}", row.len()),
            )));
        }
        let line = row.line_number;
        on_row(line, decode_tuple(file, &row));

        if rows % CANCEL_CHECK_INTERVAL == 0 && ctx.options.cancel.is_cancelled() {
            return Err(FileAbort::Failed(ValidateError::Cancelled));
        }
        if progress_interval > 0 && rows % progress_interval == 0 {
            info!(rows, "progress");
        }
    }

    info!(
        rows,
        duration_ms = started.elapsed().as_millis() as u64,
        "file complete"
    );
    Ok(rows)
}

fn ingest_abort(file: &FileTypeSchema, file_name: &str, err: IngestError) -> FileAbort {
    if err.is_malformed() {
        FileAbort::Structural(ValidationError::structural(
            file.file_type.clone(),
            file_name,
            err.line(),
            err.to_string(),
        ))
    } else {
        FileAbort::Failed(ValidateError::Ingest(err))
    }
}

/// Decompose a row into its keys.
pub(crate) fn decode_tuple(file: &FileTypeSchema, row: &Row<'_>) -> Tuple {
    let pk = file
        .pk
        .as_ref()
        .and_then(|columns| Key::new(values_at(row, &columns.indices)).ok());
    Tuple {
        pk,
        fk1: file.fk1.as_ref().and_then(|relation| relation_key(row, relation)),
        fk2: file.fk2.as_ref().and_then(|relation| relation_key(row, relation)),
    }
}

fn relation_key(row: &Row<'_>, relation: &ParentRelation) -> Option<Key> {
    let indices = &relation.columns.indices;
    if relation.optional {
        Key::optional(indices.iter().map(|&index| row.get(index).unwrap_or_default()))
    } else {
        Key::new(values_at(row, indices)).ok()
    }
}

fn values_at(row: &Row<'_>, indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .map(|&index| row.get(index).unwrap_or_default().to_string())
        .collect()
}
