use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tracing::{info, info_span, trace, warn};

use keyval_cli::logging::redact_value;
use keyval_cli::report::{ReportEnvelope, write_report};
use keyval_dictionary::{
    KeySchema, ParentRelation, default_dictionary_dir, load_default_schema, load_schema,
};
use keyval_ingest::SubmissionRoots;
use keyval_model::{DataType, ValidationReport};
use keyval_validate::{ValidateOptions, ValidationRequest, validate_submission};

use crate::cli::{DictionaryArgs, ValidateArgs};
use crate::summary::{apply_table_style, dim_cell, flag_cell, header_cell};

/// Outcome of a `validate` command.
pub struct ValidateOutcome {
    pub report: ValidationReport,
    pub report_path: Option<PathBuf>,
    pub elapsed: Duration,
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidateOutcome> {
    let started = Instant::now();
    let schema = load_schema_from(args.dictionary.as_deref())?;

    let roots = SubmissionRoots::new(args.submission.clone())
        .with_previous(args.previous.clone())
        .with_system(args.system_dir.clone());
    let mut request = ValidationRequest::new(&schema, roots);
    if !args.data_types.is_empty() {
        let data_types = args
            .data_types
            .iter()
            .map(|name| DataType::new(name.as_str()).with_context(|| format!("data type {name:?}")))
            .collect::<Result<Vec<_>>>()?;
        request = request.with_data_types(data_types);
    }

    let span = info_span!("submission", mode = %request.mode());
    let _guard = span.enter();
    if args.parallel && !cfg!(feature = "parallel") {
        warn!("built without the parallel feature, data types run sequentially");
    }
    let options = ValidateOptions::default()
        .with_store(args.store.into())
        .with_parallel_branches(args.parallel)
        .with_progress_interval(args.progress_interval);

    let report = validate_submission(&request, &options)
        .with_context(|| format!("validate {}", args.submission.display()))?;
    for error in report.errors.iter().take(args.show_errors) {
        if let Some(key) = &error.key {
            trace!(
                file_type = %error.file_type,
                kind = %error.error_kind,
                key = redact_value(&key.to_string()),
                "key error"
            );
        }
    }

    if let Some(path) = &args.report {
        let envelope = ReportEnvelope::new(&report, &args.submission)
            .with_previous(args.previous.as_deref());
        write_report(path, &envelope)?;
        info!(path = %path.display(), "report written");
    }

    Ok(ValidateOutcome {
        report,
        report_path: args.report.clone(),
        elapsed: started.elapsed(),
    })
}

pub fn run_dictionary(args: &DictionaryArgs) -> Result<()> {
    let schema = load_schema_from(args.dictionary.as_deref())?;
    println!("Dictionary version: {}", schema.version());
    println!("Fingerprint: {}", schema.fingerprint());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File type"),
        header_cell("Data type"),
        header_cell("Primary key"),
        header_cell("FK1"),
        header_cell("FK2"),
        header_cell("Surjective"),
    ]);
    apply_table_style(&mut table);
    for file_type in schema.processing_order() {
        let Some(file) = schema.file_type(file_type) else {
            continue;
        };
        let data_type = schema
            .data_type_of(file_type)
            .map_or_else(|| dim_cell("clinical"), Cell::new);
        let pk = file
            .pk
            .as_ref()
            .map_or_else(|| dim_cell("-"), |pk| Cell::new(pk.fields.join(", ")));
        table.add_row(vec![
            Cell::new(file_type),
            data_type,
            pk,
            relation_cell(file.fk1.as_ref()),
            relation_cell(file.fk2.as_ref()),
            flag_cell(file.surjective),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn load_schema_from(dir: Option<&Path>) -> Result<KeySchema> {
    let schema = match dir {
        Some(dir) => {
            load_schema(dir).with_context(|| format!("load dictionary from {}", dir.display()))?
        }
        None => load_default_schema().with_context(|| {
            format!(
                "load dictionary from {}",
                default_dictionary_dir().display()
            )
        })?,
    };
    info!(
        version = schema.version(),
        fingerprint = schema.fingerprint(),
        "dictionary loaded"
    );
    Ok(schema)
}

fn relation_cell(relation: Option<&ParentRelation>) -> Cell {
    match relation {
        Some(relation) => {
            let marker = if relation.optional { "?" } else { "" };
            Cell::new(format!(
                "{}{marker} -> {}",
                relation.columns.fields.join(", "),
                relation.parent
            ))
        }
        None => dim_cell("-"),
    }
}
