//! Reading the windows-1252 sample upload from disk.

use std::path::PathBuf;

use stix_ingest::{
    DocumentCounts, IngestError, ParseOptions, check_metadata, count_document, extract_schools,
    read_document,
};
use stix_standards::{FieldCatalog, NormalizationRules};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .join(name)
}

#[test]
fn reads_windows_1252_upload() {
    let document =
        read_document(&fixture("sample_upload.xml"), &ParseOptions::default()).expect("read");
    let catalog = FieldCatalog::default();

    let schools = extract_schools(&document, &catalog);
    assert_eq!(schools.len(), 3);
    assert_eq!(schools[0].students[0].first_name, "Renée");
    assert_eq!(schools[0].students[1].middle_name, "Paul");
    assert_eq!(schools[1].school_number, "1002");
    assert_eq!(schools[1].student_count(), 0);

    assert_eq!(
        count_document(&document, &catalog),
        DocumentCounts {
            schools: 3,
            students: 3
        }
    );
}

#[test]
fn unit_positions_are_source_lines() {
    let document =
        read_document(&fixture("sample_upload.xml"), &ParseOptions::default()).expect("read");
    let lines: Vec<usize> = document
        .iter()
        .map(|id| document.element(id))
        .filter(|element| element.local_name() == "Unit")
        .map(|element| element.position.line)
        .collect();
    assert_eq!(lines, vec![28, 49, 78]);
}

#[test]
fn sample_metadata_is_complete() {
    let document =
        read_document(&fixture("sample_upload.xml"), &ParseOptions::default()).expect("read");
    let check = check_metadata(
        &document,
        &FieldCatalog::default(),
        &NormalizationRules::default(),
    );
    assert!(check.is_complete(), "{:?}", check.missing);
    assert_eq!(check.metadata.board_number, "B66052");
}

#[test]
fn missing_file_is_reported() {
    let err = read_document(&fixture("no_such_upload.xml"), &ParseOptions::default())
        .expect_err("missing file");
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[test]
fn truncated_upload_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xml");
    std::fs::write(
        &path,
        "<?xml version=\"1.0\"?>\n<ns1:SchoolUpload xmlns:ns1=\"http://ontario.ca\">\n  <ns1:School>\n",
    )
    .unwrap();
    let err = read_document(&path, &ParseOptions { wrap_fragments: true }).expect_err("truncated");
    assert!(
        matches!(
            err,
            IngestError::UnclosedElement { .. } | IngestError::Malformed { .. }
        ),
        "{err:?}"
    );
}
