//! Drives a validation run in dependency order and assembles the report.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use tracing::{info, info_span};

use keyval_dictionary::{Branch, FileTypeSchema, KeySchema};
use keyval_ingest::{FileLocator, LocatedFiles, Side, SubmissionRoots, file_name_of};
use keyval_model::{DataType, FileType, ValidationError, ValidationMode, ValidationReport};

use crate::deletion::{check_listed_donors, load_deletions};
use crate::error::{Result, ValidateError};
use crate::file_validator::{FileAbort, FilePaths, RunContext, StageState, process_file_type};
use crate::keys::{EncounteredForeignKeys, SideKeys};
use crate::options::ValidateOptions;
use crate::plan::RunPlan;
use crate::surjectivity::{Topology, check_surjectivity};

/// What to validate.
#[derive(Debug, Clone)]
pub struct ValidationRequest<'a> {
    pub schema: &'a KeySchema,
    pub roots: SubmissionRoots,
    /// Restrict experimental data types; `None` runs every present one.
    pub data_types: Option<BTreeSet<DataType>>,
}

impl<'a> ValidationRequest<'a> {
    pub fn new(schema: &'a KeySchema, roots: SubmissionRoots) -> Self {
        Self {
            schema,
            roots,
            data_types: None,
        }
    }

    #[must_use]
    pub fn with_data_types(mut self, data_types: impl IntoIterator<Item = DataType>) -> Self {
        self.data_types = Some(data_types.into_iter().collect());
        self
    }

    pub fn mode(&self) -> ValidationMode {
        if self.roots.is_incremental() {
            ValidationMode::Incremental
        } else {
            ValidationMode::Full
        }
    }
}

/// Validate one submission and return its report.
///
/// Structural problems yield `Ok` with a report holding only those errors.
/// `Err` means the run itself failed: unreadable directories or files,
/// an unknown requested data type, or cancellation.
pub fn validate_submission(
    request: &ValidationRequest<'_>,
    options: &ValidateOptions,
) -> Result<ValidationReport> {
    let schema = request.schema;
    let mode = request.mode();
    let span = info_span!(
        "validation",
        %mode,
        submission = %request.roots.submission.display()
    );
    let _guard = span.enter();
    let started = Instant::now();
    let fatal = |errors: Vec<ValidationError>| -> Result<ValidationReport> {
        info!(errors = errors.len(), "validation aborted on structural errors");
        Ok(ValidationReport::fatal(schema.fingerprint(), mode, errors))
    };

    let located = FileLocator::new(schema, &request.roots).locate()?;
    if !located.ambiguous().is_empty() {
        let errors = located
            .ambiguous()
            .iter()
            .map(|ambiguous| {
                let names = ambiguous.file_names();
                ValidationError::structural(
                    ambiguous.file_type.clone(),
                    names.join(", "),
                    None,
                    format!(
                        "{} files match {} in {} submission",
                        names.len(),
                        ambiguous.file_type,
                        ambiguous.side
                    ),
                )
            })
            .collect();
        return fatal(errors);
    }

    let plan = RunPlan::build(schema, &located, mode, request.data_types.as_ref())?;
    let (deletions, mut structural) = load_deletions(schema, &located, mode)?;
    if plan.is_fatal() || !structural.is_empty() {
        let mut errors = plan.missing.clone();
        errors.append(&mut structural);
        return fatal(errors);
    }

    let ctx = RunContext {
        schema,
        mode,
        options,
        deletions: &deletions,
    };
    let mut remaining = plan.children.clone();

    // Clinical spine and supplemental types.
    let mut root = StageState::default();
    let root_types: Vec<&FileType> = schema
        .spine()
        .iter()
        .chain(plan.supplemental.iter().copied())
        .collect();
    for file_type in root_types {
        let file = file_schema(schema, file_type)?;
        let paths = paths_for(&located, file_type);
        let outcome = check_cancel(options)
            .and_then(|()| process_file_type(&ctx, file, paths, None, &mut root));
        match outcome {
            Ok(()) => {}
            Err(FileAbort::Structural(error)) => return fatal(vec![error]),
            Err(FileAbort::Failed(err)) => return Err(err),
        }

        if mode == ValidationMode::Incremental
            && schema.spine().first() == Some(file_type)
            && let Some(donors) = root.keys.get(file_type)
        {
            let errors = check_listed_donors(&deletions, donors)?;
            if !errors.is_empty() {
                return fatal(errors);
            }
        }

        if let Some(parent) = child_done(file, &located, &mut remaining) {
            let errors = judge(&plan, &located, schema, parent, &root.keys, &root.encountered)?;
            root.errors.extend(errors);
        }
    }

    let mut report = ValidationReport::new(schema.fingerprint(), mode);
    report.errors.append(&mut root.errors);
    report.rows_processed.append(&mut root.rows);

    // Experimental data types; branch-local parents are judged inside.
    let outcomes = run_branches(&ctx, &plan, &located, &root.keys);
    for (branch, outcome) in plan.branches.iter().zip(outcomes) {
        let mut stage = match outcome {
            Ok(stage) => stage,
            Err(FileAbort::Structural(error)) => return fatal(vec![error]),
            Err(FileAbort::Failed(err)) => return Err(err),
        };
        report.errors.append(&mut stage.errors);
        report.rows_processed.append(&mut stage.rows);
        for (parent, encountered) in stage.encountered {
            if root.keys.contains_key(&parent) {
                root.encountered
                    .entry(parent.clone())
                    .or_insert_with(|| EncounteredForeignKeys::new(parent))
                    .merge(encountered);
            }
        }

        for file_type in branch.file_types() {
            let file = file_schema(schema, file_type)?;
            let root_parent = file
                .surjective_parent()
                .is_some_and(|parent| root.keys.contains_key(parent));
            if !root_parent {
                continue;
            }
            if let Some(parent) = child_done(file, &located, &mut remaining) {
                let errors =
                    judge(&plan, &located, schema, parent, &root.keys, &root.encountered)?;
                report.errors.extend(errors);
            }
        }
    }

    info!(
        errors = report.error_count(),
        duration_ms = started.elapsed().as_millis() as u64,
        "validation complete"
    );
    Ok(report)
}

fn file_schema<'s>(schema: &'s KeySchema, file_type: &FileType) -> Result<&'s FileTypeSchema> {
    schema
        .file_type(file_type)
        .ok_or_else(|| ValidateError::UnknownFileType {
            file_type: file_type.to_string(),
        })
}

fn paths_for<'l>(located: &'l LocatedFiles, file_type: &FileType) -> FilePaths<'l> {
    FilePaths {
        original: located.get(file_type, Side::Original),
        new: located.get(file_type, Side::New),
    }
}

fn is_present(located: &LocatedFiles, file_type: &FileType) -> bool {
    located.contains(file_type, Side::New) || located.contains(file_type, Side::Original)
}

fn check_cancel(options: &ValidateOptions) -> std::result::Result<(), FileAbort> {
    if options.cancel.is_cancelled() {
        Err(FileAbort::Failed(ValidateError::Cancelled))
    } else {
        Ok(())
    }
}

/// Count down the surjective parent of a finished child; returns the
/// parent once its last child is done.
fn child_done<'f>(
    file: &'f FileTypeSchema,
    located: &LocatedFiles,
    remaining: &mut BTreeMap<FileType, usize>,
) -> Option<&'f FileType> {
    let parent = file.surjective_parent()?;
    if !is_present(located, &file.file_type) {
        return None;
    }
    let count = remaining.get_mut(parent)?;
    *count = count.saturating_sub(1);
    (*count == 0).then_some(parent)
}

fn judge(
    plan: &RunPlan<'_>,
    located: &LocatedFiles,
    schema: &KeySchema,
    parent: &FileType,
    keys: &BTreeMap<FileType, SideKeys>,
    encountered: &BTreeMap<FileType, EncounteredForeignKeys>,
) -> Result<Vec<ValidationError>> {
    if plan.incomplete.contains(parent) {
        tracing::debug!(parent = %parent, "surjectivity skipped, children filtered out");
        return Ok(Vec::new());
    }
    let Some(parent_keys) = keys.get(parent) else {
        return Ok(Vec::new());
    };
    let file = file_schema(schema, parent)?;
    let file_name = located
        .get(parent, Side::New)
        .or_else(|| located.get(parent, Side::Original))
        .map(file_name_of)
        .unwrap_or_default();
    Ok(check_surjectivity(
        file,
        parent_keys,
        encountered.get(parent),
        &file_name,
        Topology::for_children(plan.children_of(parent)),
    ))
}

/// Run every scheduled data type, returning outcomes in layout order.
fn run_branches(
    ctx: &RunContext<'_>,
    plan: &RunPlan<'_>,
    located: &LocatedFiles,
    shared: &BTreeMap<FileType, SideKeys>,
) -> Vec<std::result::Result<StageState, FileAbort>> {
    #[cfg(feature = "parallel")]
    if ctx.options.parallel_branches {
        use rayon::prelude::*;

        return plan
            .branches
            .par_iter()
            .map(|branch| run_branch(ctx, plan, branch, located, shared))
            .collect();
    }

    let mut outcomes = Vec::with_capacity(plan.branches.len());
    for branch in &plan.branches {
        let outcome = run_branch(ctx, plan, branch, located, shared);
        let failed = outcome.is_err();
        outcomes.push(outcome);
        if failed {
            break;
        }
    }
    outcomes
}

fn run_branch(
    ctx: &RunContext<'_>,
    plan: &RunPlan<'_>,
    branch: &Branch,
    located: &LocatedFiles,
    shared: &BTreeMap<FileType, SideKeys>,
) -> std::result::Result<StageState, FileAbort> {
    let span = info_span!("data_type", name = %branch.data_type);
    let _guard = span.enter();

    let mut stage = StageState::default();
    let mut remaining = plan.children.clone();
    for file_type in branch.file_types() {
        check_cancel(ctx.options)?;
        let file = file_schema(ctx.schema, file_type)?;
        process_file_type(ctx, file, paths_for(located, file_type), Some(shared), &mut stage)?;

        let local_parent = file
            .surjective_parent()
            .is_some_and(|parent| stage.keys.contains_key(parent));
        if !local_parent {
            continue;
        }
        if let Some(parent) = child_done(file, located, &mut remaining) {
            let errors = judge(
                plan,
                located,
                ctx.schema,
                parent,
                &stage.keys,
                &stage.encountered,
            )?;
            stage.errors.extend(errors);
        }
    }
    Ok(stage)
}
