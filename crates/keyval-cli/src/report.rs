//! JSON report written next to a validation run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use keyval_model::{ReportSummary, ValidationReport};

/// A report plus the run metadata consumers need to file it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEnvelope<'a> {
    pub generated_at: DateTime<Utc>,
    pub tool_version: &'static str,
    pub submission: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<&'a Path>,
    #[serde(flatten)]
    pub report: &'a ValidationReport,
    pub summary: ReportSummary,
}

impl<'a> ReportEnvelope<'a> {
    pub fn new(report: &'a ValidationReport, submission: &'a Path) -> Self {
        Self {
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION"),
            submission,
            previous: None,
            report,
            summary: report.summary(),
        }
    }

    #[must_use]
    pub fn with_previous(mut self, previous: Option<&'a Path>) -> Self {
        self.previous = previous;
        self
    }

    #[must_use]
    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }
}

/// Write the envelope as pretty JSON, replacing any existing file.
pub fn write_report(path: &Path, envelope: &ReportEnvelope<'_>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, envelope)
        .with_context(|| format!("serialize report to {}", path.display()))?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .with_context(|| format!("write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "report written");
    Ok(())
}
