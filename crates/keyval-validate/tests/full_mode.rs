//! Full submissions: uniqueness, relations and surjectivity.

mod common;

use keyval_ingest::SubmissionRoots;
use keyval_model::{DataType, ErrorKind, ValidationMode};
use keyval_validate::{ValidateError, ValidateOptions, ValidationRequest, validate_submission};

use common::{Submission, ft, full, key, of_kind, run, schema};

const META: &[&str] = &["analysis_id", "analyzed_sample_id", "matched_sample_id"];
const PRIMARY: &[&str] = &["analysis_id", "analyzed_sample_id"];

#[test]
fn consistent_submission_is_valid() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .clinical(&["D1", "D2"])
        .file("ssm_m", META, &[&["A1", "SA1", "-888"], &["A1", "SA2", ""]])
        .file("ssm_p", PRIMARY, &[&["A1", "SA1"], &["A1", "SA2"], &["A1", "SA2"]]);

    let report = full(&schema, &submission);
    assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
    assert_eq!(report.mode, ValidationMode::Full);
    assert_eq!(report.dictionary_fingerprint, schema.fingerprint());
    assert_eq!(report.rows_processed.get(&ft("donor")), Some(&2));
    assert_eq!(report.rows_processed.get(&ft("ssm_p")), Some(&3));
}

#[test]
fn unknown_donor_and_unreferenced_donor() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .file("donor", &["donor_id"], &[&["D1"], &["D2"]])
        .file(
            "specimen",
            &["donor_id", "specimen_id"],
            &[&["D1", "S1"], &["D3", "S2"]],
        )
        .file(
            "sample",
            &["analyzed_sample_id", "specimen_id"],
            &[&["SA1", "S1"], &["SA2", "S2"]],
        );

    let report = full(&schema, &submission);
    assert_eq!(report.error_count(), 2, "{:?}", report.errors);
    assert_eq!(report.count(ErrorKind::Uniqueness), 0);

    let relation = &of_kind(&report, ErrorKind::PrimaryRelation)[0];
    assert_eq!(relation.file_type, ft("specimen"));
    assert_eq!(relation.file_name, "specimen.txt");
    assert_eq!(relation.line_number, Some(3));
    assert_eq!(relation.key, Some(key(&["D3"])));
    assert_eq!(relation.referenced_file_type, Some(ft("donor")));

    let surjection = &of_kind(&report, ErrorKind::Surjection)[0];
    assert_eq!(surjection.file_type, ft("donor"));
    assert_eq!(surjection.line_number, None);
    assert_eq!(surjection.key, Some(key(&["D2"])));
    assert_eq!(surjection.field_names, ["donor_id"]);
}

#[test]
fn duplicate_key_reported_once_on_second_occurrence() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission.clinical(&["D1"]).file(
        "donor",
        &["donor_id"],
        &[&["D1"], &["D1"]],
    );

    let report = full(&schema, &submission);
    let duplicates = of_kind(&report, ErrorKind::Uniqueness);
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].line_number, Some(3));
    assert_eq!(duplicates[0].key, Some(key(&["D1"])));
    assert_eq!(report.error_count(), 1);
}

#[test]
fn unmatched_child_still_enters_its_key_set() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .file("donor", &["donor_id"], &[&["D1"]])
        .file(
            "specimen",
            &["donor_id", "specimen_id"],
            &[&["D9", "S1"], &["D1", "S1"]],
        )
        .file("sample", &["analyzed_sample_id", "specimen_id"], &[&["SA1", "S1"]]);

    let report = full(&schema, &submission);
    let relations = of_kind(&report, ErrorKind::PrimaryRelation);
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].line_number, Some(2));
    let duplicates = of_kind(&report, ErrorKind::Uniqueness);
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].line_number, Some(3));
    assert_eq!(report.count(ErrorKind::Surjection), 0);
}

#[test]
fn missing_matched_sample_is_a_secondary_relation_error() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .clinical(&["D1"])
        .file("ssm_m", META, &[&["A1", "SA1", "SA9"]])
        .file("ssm_p", PRIMARY, &[&["A1", "SA1"]]);

    let report = full(&schema, &submission);
    assert_eq!(report.count(ErrorKind::PrimaryRelation), 0);
    let secondary = of_kind(&report, ErrorKind::SecondaryRelation);
    assert_eq!(secondary.len(), 1);
    assert_eq!(secondary[0].file_type, ft("ssm_m"));
    assert_eq!(secondary[0].key, Some(key(&["SA9"])));
    assert_eq!(secondary[0].field_names, ["matched_sample_id"]);
    assert_eq!(secondary[0].referenced_file_type, Some(ft("sample")));
    assert_eq!(report.error_count(), 1);
}

#[test]
fn missing_codes_in_optional_foreign_key_are_not_checked() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .clinical(&["D1", "D2", "D3"])
        .file(
            "ssm_m",
            META,
            &[&["A1", "SA1", "-888"], &["A2", "SA2", "-777"], &["A3", "SA3", "-999"]],
        )
        .file("ssm_p", PRIMARY, &[&["A1", "SA1"], &["A2", "SA2"], &["A3", "SA3"]]);

    let report = full(&schema, &submission);
    assert!(report.is_valid(), "{:?}", report.errors);
}

#[test]
fn sample_surjection_merges_every_present_branch() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .clinical(&["D1", "D2", "D3"])
        .file("ssm_m", META, &[&["A1", "SA1", "-888"]])
        .file("ssm_p", PRIMARY, &[&["A1", "SA1"]])
        .file("cnsm_m", META, &[&["C1", "SA2", "-888"]])
        .file(
            "cnsm_p",
            &["analysis_id", "analyzed_sample_id", "mutation_id"],
            &[&["C1", "SA2", "M1"]],
        );

    let report = full(&schema, &submission);
    let surjections = of_kind(&report, ErrorKind::Surjection);
    assert_eq!(surjections.len(), 1, "{:?}", report.errors);
    assert_eq!(surjections[0].file_type, ft("sample"));
    assert_eq!(surjections[0].key, Some(key(&["SA3"])));
    assert_eq!(surjections[0].file_name, "sample.txt");
    assert_eq!(report.error_count(), 1);
}

#[test]
fn matched_control_counts_as_referenced() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .clinical(&["D1", "D2"])
        .file("ssm_m", META, &[&["A1", "SA1", "SA2"]])
        .file("ssm_p", PRIMARY, &[&["A1", "SA1"]]);

    let report = full(&schema, &submission);
    assert!(report.is_valid(), "{:?}", report.errors);
}

#[test]
fn meta_rows_without_primary_rows_are_unreferenced() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .clinical(&["D1", "D2"])
        .file("ssm_m", META, &[&["A1", "SA1", "-888"], &["A2", "SA2", "-888"]])
        .file("ssm_p", PRIMARY, &[&["A1", "SA1"], &["A1", "SA9"]]);

    let report = full(&schema, &submission);
    let relation = of_kind(&report, ErrorKind::PrimaryRelation);
    assert_eq!(relation.len(), 1);
    assert_eq!(relation[0].key, Some(key(&["A1", "SA9"])));
    assert_eq!(relation[0].referenced_file_type, Some(ft("ssm_m")));
    let surjection = of_kind(&report, ErrorKind::Surjection);
    assert_eq!(surjection.len(), 1);
    assert_eq!(surjection[0].file_type, ft("ssm_m"));
    assert_eq!(surjection[0].key, Some(key(&["A2", "SA2"])));
}

#[test]
fn surjection_errors_follow_key_order() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .file("donor", &["donor_id"], &[&["D3"], &["D1"], &["D4"], &["D2"]])
        .file("specimen", &["donor_id", "specimen_id"], &[&["D4", "S4"]])
        .file("sample", &["analyzed_sample_id", "specimen_id"], &[&["SA4", "S4"]]);

    let report = full(&schema, &submission);
    let keys: Vec<_> = of_kind(&report, ErrorKind::Surjection)
        .iter()
        .filter_map(|error| error.key.clone())
        .collect();
    assert_eq!(keys, [key(&["D1"]), key(&["D2"]), key(&["D3"])]);
}

#[test]
fn supplemental_files_check_relations() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .clinical(&["D1", "D2"])
        .file("therapy", &["donor_id"], &[&["D1"], &["D9"]]);

    let report = full(&schema, &submission);
    let relations = of_kind(&report, ErrorKind::PrimaryRelation);
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].file_type, ft("therapy"));
    assert_eq!(relations[0].key, Some(key(&["D9"])));
    assert_eq!(report.error_count(), 1);
}

#[test]
fn supplemental_files_have_unique_keys() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .clinical(&["D1", "D2"])
        .file("therapy", &["donor_id"], &[&["D1"], &["D1"]])
        .file("exposure", &["donor_id"], &[&["D2"], &["D1"], &["D2"]])
        .file(
            "surgery",
            &["donor_id", "specimen_id"],
            &[&["D1", "S1"], &["D2", "S2"], &["D1", "S1"]],
        );

    let report = full(&schema, &submission);
    let duplicates = of_kind(&report, ErrorKind::Uniqueness);
    assert_eq!(duplicates.len(), 3, "{:?}", report.errors);
    let found: Vec<_> = duplicates
        .iter()
        .map(|error| (error.file_type.as_str(), error.line_number, error.key.clone()))
        .collect();
    assert_eq!(
        found,
        [
            ("exposure", Some(4), Some(key(&["D2"]))),
            ("surgery", Some(4), Some(key(&["D1", "S1"]))),
            ("therapy", Some(3), Some(key(&["D1"]))),
        ]
    );
    assert_eq!(duplicates[1].field_names, ["donor_id", "specimen_id"]);
    assert_eq!(report.error_count(), 3);
}

#[test]
fn family_rows_are_keyed_on_every_column() {
    let schema = schema();
    let columns = &["donor_id", "relationship_type", "relationship_sex"];
    let submission = Submission::new(&schema);
    submission.clinical(&["D1"]).file(
        "family",
        columns,
        &[&["D1", "sibling", "female"], &["D1", "sibling", "male"], &["D1", "sibling", "female"]],
    );

    let report = full(&schema, &submission);
    let duplicates = of_kind(&report, ErrorKind::Uniqueness);
    assert_eq!(duplicates.len(), 1, "{:?}", report.errors);
    assert_eq!(duplicates[0].line_number, Some(4));
    assert_eq!(duplicates[0].field_names.len(), 8);
}

#[test]
fn gzip_files_are_read_transparently() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .clinical(&["D1"])
        .gz_file("ssm_m", META, &[&["A1", "SA1", "-888"]])
        .gz_file("ssm_p", PRIMARY, &[&["A1", "SA1"], &["A1", "SA7"]]);

    let report = full(&schema, &submission);
    assert_eq!(report.count(ErrorKind::PrimaryRelation), 1);
    assert_eq!(report.errors[0].file_name, "ssm_p.txt.gz");
}

#[test]
fn filtered_data_types_are_skipped_with_their_sample_check() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .clinical(&["D1", "D2"])
        .file("ssm_m", META, &[&["A1", "SA1", "-888"]])
        .file("ssm_p", PRIMARY, &[&["A1", "SA1"]])
        .file("cnsm_m", META, &[&["C1", "SA2", "-888"]])
        .file(
            "cnsm_p",
            &["analysis_id", "analyzed_sample_id", "mutation_id"],
            &[&["C1", "SA2", "M1"], &["C1", "SA2", "M1"]],
        );

    let ssm = DataType::new("ssm").expect("data type");
    let request = ValidationRequest::new(&schema, SubmissionRoots::new(submission.path()))
        .with_data_types([ssm]);
    let report = validate_submission(&request, &ValidateOptions::default()).expect("run");
    assert!(report.is_valid(), "{:?}", report.errors);
    assert!(!report.rows_processed.contains_key(&ft("cnsm_p")));

    let everything = run(&schema, SubmissionRoots::new(submission.path()));
    assert_eq!(everything.count(ErrorKind::Uniqueness), 1);
}

#[test]
fn unknown_requested_data_type_is_an_error() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission.clinical(&["D1"]);

    let bogus = DataType::new("proteomics").expect("data type");
    let request = ValidationRequest::new(&schema, SubmissionRoots::new(submission.path()))
        .with_data_types([bogus]);
    let err = validate_submission(&request, &ValidateOptions::default()).unwrap_err();
    assert!(matches!(err, ValidateError::UnknownDataType { ref data_type } if data_type == "proteomics"));
}

#[test]
fn marker_file_is_ignored_in_full_runs() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .clinical(&["D1"])
        .raw("to_be_removed.txt", "donor_id\tfeature_types\nD7\tbogus\n");

    let report = full(&schema, &submission);
    assert!(report.is_valid(), "{:?}", report.errors);
}

#[test]
fn system_files_only_contribute_keys() {
    let schema = schema();
    let submission = Submission::new(&schema);
    submission
        .clinical(&["D1"])
        .file("meth_array_m", PRIMARY, &[&["A1", "SA1"]])
        .file(
            "meth_array_probes",
            &["array_platform", "probe_id"],
            &[&["GPL1", "cg01"], &["GPL1", "cg01"], &["GPL1", "cg02"]],
        )
        .file(
            "meth_array_p",
            &["analysis_id", "analyzed_sample_id", "array_platform", "probe_id"],
            &[&["A1", "SA1", "GPL1", "cg01"], &["A1", "SA1", "GPL1", "cg09"]],
        );

    let report = full(&schema, &submission);
    assert_eq!(report.count(ErrorKind::Uniqueness), 0, "{:?}", report.errors);
    assert_eq!(report.rows_processed.get(&ft("meth_array_probes")), Some(&3));

    // Probe keys still back the secondary relation of the primary file.
    let secondary = of_kind(&report, ErrorKind::SecondaryRelation);
    assert_eq!(secondary.len(), 1, "{:?}", report.errors);
    assert_eq!(secondary[0].file_type, ft("meth_array_p"));
    assert_eq!(secondary[0].line_number, Some(3));
    assert_eq!(secondary[0].key, Some(key(&["GPL1", "cg09"])));
    assert_eq!(report.error_count(), 1);
}
