//! Tests for keyval-model types.

use keyval_model::{
    ErrorKind, FileType, Key, ValidationError, ValidationMode, ValidationReport, is_missing_code,
};

fn ft(name: &str) -> FileType {
    FileType::new(name).expect("file type")
}

#[test]
fn file_type_is_normalized() {
    assert_eq!(ft(" SSM_M ").as_str(), "ssm_m");
    assert!(FileType::new("").is_err());
    assert!(FileType::new("ssm m").is_err());
}

#[test]
fn keys_order_lexicographically() {
    let a = Key::of(&["A1", "S1"]).unwrap();
    let b = Key::of(&["A1", "S2"]).unwrap();
    let c = Key::of(&["A2", "S0"]).unwrap();
    assert!(a < b);
    assert!(b < c);
    assert_eq!(a.to_string(), "[A1, S1]");
}

#[test]
fn empty_key_is_rejected() {
    assert!(Key::new(Vec::new()).is_err());
}

#[test]
fn optional_key_treats_missing_codes_as_absent() {
    assert_eq!(Key::optional(["-888"]), None);
    assert_eq!(Key::optional(["-777"]), None);
    assert_eq!(Key::optional(["S1", "-999"]), None);
    assert_eq!(Key::optional([""]), None);
    assert_eq!(Key::optional(["S9"]), Some(Key::of(&["S9"]).unwrap()));
    assert!(is_missing_code("-888"));
    assert!(!is_missing_code("-1"));
}

#[test]
fn structural_errors_are_fatal() {
    let report = ValidationReport::fatal(
        "fp",
        ValidationMode::Full,
        vec![ValidationError::structural(
            ft("sample"),
            "",
            None,
            "2 files match",
        )],
    );
    assert!(report.is_fatal());
    assert!(ErrorKind::Structural.is_fatal());
    assert!(!ErrorKind::UniqueNew.is_fatal());
}

#[test]
fn validation_error_serializes_camel_case() {
    let error = ValidationError::for_key(
        ErrorKind::PrimaryRelation,
        ft("specimen"),
        "specimen.txt",
        Some(3),
        Key::of(&["D3"]).unwrap(),
        &["donor_id".to_string()],
    )
    .with_referenced(ft("donor"));
    let value = serde_json::to_value(&error).expect("serialize");
    assert_eq!(value["fileType"], "specimen");
    assert_eq!(value["lineNumber"], 3);
    assert_eq!(value["errorKind"], "PRIMARY_RELATION");
    assert_eq!(value["key"], serde_json::json!(["D3"]));
    assert_eq!(value["referencedFileType"], "donor");
    assert!(value.get("message").is_none());
}

#[test]
fn summary_groups_by_file_type() {
    let mut report = ValidationReport::new("fp", ValidationMode::Incremental);
    for (kind, file_type) in [
        (ErrorKind::UniqueNew, "donor"),
        (ErrorKind::UniqueOriginal, "donor"),
        (ErrorKind::UniqueNew, "donor"),
        (ErrorKind::Surjection, "sample"),
    ] {
        report.errors.push(ValidationError::for_key(
            kind,
            ft(file_type),
            "f.txt",
            None,
            Key::of(&["X"]).unwrap(),
            &[],
        ));
    }
    let summary = report.summary();
    assert_eq!(summary.total_errors, 4);
    assert_eq!(summary.by_kind[&ErrorKind::UniqueNew], 2);
    assert_eq!(summary.by_file_type[&ft("donor")].len(), 2);
    assert_eq!(summary.by_file_type[&ft("sample")][&ErrorKind::Surjection], 1);

    let json = serde_json::to_string(&report).expect("serialize report");
    let round: ValidationReport = serde_json::from_str(&json).expect("deserialize report");
    assert_eq!(round.errors.len(), 4);
    assert_eq!(round.mode, ValidationMode::Incremental);
}
