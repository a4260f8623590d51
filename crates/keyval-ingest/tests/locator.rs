//! Tests for submission file location.

use std::fs;
use std::path::{Path, PathBuf};

use keyval_dictionary::{KeySchema, load_schema};
use keyval_ingest::{
    FileLocator, IngestError, Side, SubmissionRoots, TO_BE_REMOVED_FILE_NAME, list_data_files,
};
use keyval_model::{DataType, FileType};

fn schema() -> KeySchema {
    load_schema(&PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../dictionary"))
        .expect("bundled schema")
}

fn ft(name: &str) -> FileType {
    FileType::new(name).expect("file type")
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), "x\n").expect("write file");
}

#[test]
fn locates_one_file_per_type() {
    let dir = tempfile::tempdir().expect("temp dir");
    for name in ["donor.txt", "specimen.txt", "sample.txt.gz", "ssm_m.txt", "README.md"] {
        touch(dir.path(), name);
    }
    fs::create_dir(dir.path().join("ssm_p.txt")).expect("directory named like a file");

    let schema = schema();
    let roots = SubmissionRoots::new(dir.path());
    let located = FileLocator::new(&schema, &roots).locate().expect("locate");

    assert!(located.ambiguous().is_empty());
    assert!(located.contains(&ft("donor"), Side::New));
    assert_eq!(
        located.get(&ft("sample"), Side::New),
        Some(dir.path().join("sample.txt.gz").as_path())
    );
    assert!(!located.contains(&ft("ssm_p"), Side::New));
    assert!(!located.contains(&ft("donor"), Side::Original));

    let ssm = schema.branch(&DataType::new("ssm").unwrap()).unwrap();
    let cnsm = schema.branch(&DataType::new("cnsm").unwrap()).unwrap();
    assert!(located.has_data_type(ssm, Side::New));
    assert!(!located.has_data_type(cnsm, Side::New));
    assert!(located.deletion_marker().is_none());
}

#[test]
fn two_matches_for_one_type_are_ambiguous() {
    let dir = tempfile::tempdir().expect("temp dir");
    for name in ["donor.txt", "specimen.txt", "sample.a.txt", "sample.b.txt"] {
        touch(dir.path(), name);
    }
    let schema = schema();
    let roots = SubmissionRoots::new(dir.path());
    let located = FileLocator::new(&schema, &roots).locate().expect("locate");

    assert_eq!(located.ambiguous().len(), 1);
    let ambiguous = &located.ambiguous()[0];
    assert_eq!(ambiguous.file_type, ft("sample"));
    assert_eq!(ambiguous.side, Side::New);
    assert_eq!(ambiguous.file_names(), ["sample.a.txt", "sample.b.txt"]);
    assert!(!located.contains(&ft("sample"), Side::New));
}

#[test]
fn previous_release_and_system_dirs_are_searched() {
    let new_dir = tempfile::tempdir().expect("temp dir");
    let old_dir = tempfile::tempdir().expect("temp dir");
    let system_dir = tempfile::tempdir().expect("temp dir");
    touch(new_dir.path(), "meth_array_m.txt");
    touch(new_dir.path(), TO_BE_REMOVED_FILE_NAME);
    touch(old_dir.path(), "donor.txt");
    touch(old_dir.path(), "meth_array_probes.txt");
    touch(system_dir.path(), "meth_array_probes.txt");

    let schema = schema();
    let roots = SubmissionRoots::new(new_dir.path())
        .with_previous(Some(old_dir.path().to_path_buf()))
        .with_system(Some(system_dir.path().to_path_buf()));
    assert!(roots.is_incremental());
    let located = FileLocator::new(&schema, &roots).locate().expect("locate");

    assert!(located.contains(&ft("donor"), Side::Original));
    assert!(!located.contains(&ft("donor"), Side::New));
    assert_eq!(
        located.get(&ft("meth_array_probes"), Side::New),
        Some(system_dir.path().join("meth_array_probes.txt").as_path())
    );
    assert!(!located.contains(&ft("meth_array_probes"), Side::Original));
    assert_eq!(
        located.deletion_marker(),
        Some(new_dir.path().join(TO_BE_REMOVED_FILE_NAME).as_path())
    );
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("nope");
    let err = list_data_files(&missing).unwrap_err();
    assert!(matches!(err, IngestError::DirectoryNotFound { .. }));

    let schema = schema();
    let roots = SubmissionRoots::new(&missing);
    assert!(FileLocator::new(&schema, &roots).locate().is_err());
}

#[test]
fn listing_is_sorted_by_name() {
    let dir = tempfile::tempdir().expect("temp dir");
    for name in ["c.txt", "a.txt", "b.txt"] {
        touch(dir.path(), name);
    }
    let files = list_data_files(dir.path()).expect("list");
    let names: Vec<_> = files
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);
}
