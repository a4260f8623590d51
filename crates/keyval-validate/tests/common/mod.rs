//! Fixture helpers shared by the engine tests.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use keyval_dictionary::{KeySchema, load_schema};
use keyval_ingest::SubmissionRoots;
use keyval_model::{ErrorKind, FileType, Key, ValidationError, ValidationReport};
use keyval_validate::{ValidateOptions, ValidationRequest, validate_submission};

pub fn schema() -> KeySchema {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../dictionary");
    load_schema(&dir).expect("load bundled schema")
}

pub fn ft(name: &str) -> FileType {
    FileType::new(name).expect("file type")
}

pub fn key(values: &[&str]) -> Key {
    Key::of(values).expect("key")
}

/// A submission directory written from key columns only; every other
/// dictionary field is filled with a placeholder.
pub struct Submission<'s> {
    schema: &'s KeySchema,
    dir: TempDir,
}

impl<'s> Submission<'s> {
    pub fn new(schema: &'s KeySchema) -> Self {
        Self {
            schema,
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `<file_type>.txt` with the dictionary header.
    pub fn file(&self, file_type: &str, columns: &[&str], rows: &[&[&str]]) -> &Self {
        self.file_named(&format!("{file_type}.txt"), file_type, columns, rows)
    }

    pub fn file_named(
        &self,
        file_name: &str,
        file_type: &str,
        columns: &[&str],
        rows: &[&[&str]],
    ) -> &Self {
        let contents = self.render(file_type, columns, rows);
        fs::write(self.path().join(file_name), contents).expect("write data file");
        self
    }

    pub fn gz_file(&self, file_type: &str, columns: &[&str], rows: &[&[&str]]) -> &Self {
        let contents = self.render(file_type, columns, rows);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(contents.as_bytes()).expect("compress");
        let bytes = encoder.finish().expect("finish gzip");
        fs::write(self.path().join(format!("{file_type}.txt.gz")), bytes).expect("write gz");
        self
    }

    pub fn raw(&self, file_name: &str, contents: &str) -> &Self {
        fs::write(self.path().join(file_name), contents).expect("write raw file");
        self
    }

    fn render(&self, file_type: &str, columns: &[&str], rows: &[&[&str]]) -> String {
        let schema = self.schema.file_type(&ft(file_type)).expect("known file type");
        let mut out = schema.field_names.join("\t");
        out.push('\n');
        for row in rows {
            assert_eq!(row.len(), columns.len(), "fixture row width");
            let values: Vec<&str> = schema
                .field_names
                .iter()
                .map(|field| {
                    columns
                        .iter()
                        .position(|column| column == field)
                        .map_or("x", |index| row[index])
                })
                .collect();
            out.push_str(&values.join("\t"));
            out.push('\n');
        }
        out
    }

    /// Donors D1..Dn, one specimen and one sample per donor.
    pub fn clinical(&self, donors: &[&str]) -> &Self {
        let donor_rows: Vec<Vec<&str>> = donors.iter().map(|donor| vec![*donor]).collect();
        let specimens: Vec<(String, String)> = donors
            .iter()
            .map(|donor| ((*donor).to_string(), format!("S{}", &donor[1..])))
            .collect();
        let samples: Vec<(String, String)> = specimens
            .iter()
            .map(|(_, specimen)| (format!("SA{}", &specimen[1..]), specimen.clone()))
            .collect();

        self.file("donor", &["donor_id"], &as_rows(&donor_rows));
        let specimen_rows: Vec<Vec<&str>> = specimens
            .iter()
            .map(|(donor, specimen)| vec![donor.as_str(), specimen.as_str()])
            .collect();
        self.file("specimen", &["donor_id", "specimen_id"], &as_rows(&specimen_rows));
        let sample_rows: Vec<Vec<&str>> = samples
            .iter()
            .map(|(sample, specimen)| vec![sample.as_str(), specimen.as_str()])
            .collect();
        self.file(
            "sample",
            &["analyzed_sample_id", "specimen_id"],
            &as_rows(&sample_rows),
        )
    }
}

fn as_rows<'a>(rows: &'a [Vec<&'a str>]) -> Vec<&'a [&'a str]> {
    rows.iter().map(Vec::as_slice).collect()
}

pub fn run(schema: &KeySchema, roots: SubmissionRoots) -> ValidationReport {
    run_with(schema, roots, &ValidateOptions::default())
}

pub fn run_with(
    schema: &KeySchema,
    roots: SubmissionRoots,
    options: &ValidateOptions,
) -> ValidationReport {
    let request = ValidationRequest::new(schema, roots);
    validate_submission(&request, options).expect("validation run")
}

pub fn full(schema: &KeySchema, submission: &Submission<'_>) -> ValidationReport {
    run(schema, SubmissionRoots::new(submission.path()))
}

pub fn incremental(
    schema: &KeySchema,
    previous: &Submission<'_>,
    delta: &Submission<'_>,
) -> ValidationReport {
    let roots =
        SubmissionRoots::new(delta.path()).with_previous(Some(previous.path().to_path_buf()));
    run(schema, roots)
}

pub fn of_kind(report: &ValidationReport, kind: ErrorKind) -> Vec<&ValidationError> {
    report
        .errors
        .iter()
        .filter(|error| error.error_kind == kind)
        .collect()
}
