//! Tests for deletion file parsing.

use std::fs;

use keyval_ingest::{DeletionData, DeletionScope};
use keyval_model::DataType;

fn known() -> Vec<DataType> {
    ["ssm", "cnsm", "meth_array"]
        .into_iter()
        .map(|name| DataType::new(name).unwrap())
        .collect()
}

fn parse(contents: &str) -> (DeletionData, Vec<keyval_ingest::DeletionProblem>) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("to_be_removed.txt");
    fs::write(&path, contents).expect("write");
    DeletionData::parse(&path, &known()).expect("parse")
}

#[test]
fn parses_all_and_feature_lists() {
    let (data, problems) = parse("donor_id\tfeature_types\nD1\tall\nD2\tssm,cnsm\n");
    assert!(problems.is_empty(), "{problems:?}");
    assert_eq!(data.len(), 2);
    assert_eq!(data.scope("D1"), Some(&DeletionScope::All));
    let scope = data.scope("D2").unwrap();
    assert!(scope.covers(&DataType::new("ssm").unwrap()));
    assert!(!scope.covers(&DataType::new("meth_array").unwrap()));
    assert!(!scope.covers_clinical());
    assert_eq!(scope.to_string(), "cnsm,ssm");
    assert_eq!(data.entry("D2").unwrap().line_number, 3);
}

#[test]
fn duplicate_donor_is_a_problem() {
    let (data, problems) = parse("donor_id\tfeature_types\nD1\tall\nD1\tssm\n");
    assert_eq!(data.len(), 1);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].line_number, 3);
    assert!(problems[0].message.contains("already listed on line 2"));
}

#[test]
fn all_must_stand_alone() {
    let (_, problems) = parse("donor_id\tfeature_types\nD1\tall,ssm\n");
    assert_eq!(problems.len(), 1);
    assert!(problems[0].message.contains("must appear alone"));
}

#[test]
fn duplicate_and_unknown_feature_types_are_problems() {
    let (data, problems) = parse("donor_id\tfeature_types\nD1\tssm,ssm\nD2\tmirna\nD3\t\n");
    assert!(data.is_empty());
    let messages: Vec<&str> = problems.iter().map(|p| p.message.as_str()).collect();
    assert_eq!(problems.len(), 3);
    assert!(messages[0].contains("duplicate feature type"));
    assert!(messages[1].contains("unknown feature type"));
    assert!(messages[2].contains("empty feature type"));
}

#[test]
fn wrong_column_count_is_a_problem() {
    let (_, problems) = parse("donor_id\tfeature_types\nD1\n");
    assert_eq!(problems.len(), 1);
    assert!(problems[0].message.contains("expected 2 columns"));
}

#[test]
fn unexpected_header_is_a_problem() {
    let (data, problems) = parse("donor\ttypes\nD1\tall\n");
    assert!(data.is_empty());
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].line_number, 1);
    assert!(problems[0].message.contains("expected header"));
}
