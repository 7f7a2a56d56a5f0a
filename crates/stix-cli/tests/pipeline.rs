//! File-level runs of the clean, export and rename commands.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use stix_cli::pipeline::{
    CleanConfig, default_audit_path, default_output_path, rename_upload, run_clean, run_export,
    verify_output,
};
use stix_cli::prompt::TerminalResolver;
use stix_core::DeferResolver;
use stix_ingest::{DocumentCounts, ParseOptions};
use stix_report::{AuditFormat, ExportOptions, SchoolLevel};
use stix_standards::NormalizationRules;

const NEEDS_REVIEW: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ns1:SchoolUpload xmlns:ns1="http://ontario.ca">
  <ns1:Metadata>
    <ns1:CreateDate>2024-09-30</ns1:CreateDate>
    <ns1:SchoolBoard><ns1:BoardNumber>B66052</ns1:BoardNumber></ns1:SchoolBoard>
  </ns1:Metadata>
  <ns1:School>
    <ns1:SchoolNumber>7</ns1:SchoolNumber>
    <ns1:Name>Northview</ns1:Name>
    <ns1:Students>
      <ns1:Student>
        <ns1:Address>
          <ns1:Unit>Apartment B</ns1:Unit>
          <ns1:StreetNumber>12</ns1:StreetNumber>
        </ns1:Address>
      </ns1:Student>
    </ns1:Students>
  </ns1:School>
</ns1:SchoolUpload>
"#;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .join(name)
}

fn copy_fixture(dir: &Path, name: &str) -> PathBuf {
    let target = dir.join(name);
    fs::copy(fixture("sample_upload.xml"), &target).unwrap();
    target
}

#[test]
fn clean_writes_output_and_audit_log() {
    let dir = tempfile::tempdir().unwrap();
    let input = copy_fixture(dir.path(), "upload.xml");
    let config = CleanConfig {
        input: input.clone(),
        ..CleanConfig::default()
    };

    let result = run_clean(&config, &mut DeferResolver).expect("clean");

    assert_eq!(result.output, default_output_path(&input));
    assert_eq!(result.audit_log, default_audit_path(&input));
    assert_eq!(
        result.report.counts,
        DocumentCounts {
            schools: 2,
            students: 3
        }
    );

    let output = fs::read_to_string(&result.output).unwrap();
    assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
    assert!(output.contains("Renée"));
    assert!(!output.contains("<ns1:SchoolNumber>1002</ns1:SchoolNumber>"));

    let audit = fs::read_to_string(&result.audit_log).unwrap();
    assert!(audit.contains("| School | '1002' | REMOVED | no students"));
    assert!(audit.lines().last().unwrap().starts_with("SUMMARY | schools removed: 1"));
}

#[test]
fn operator_reply_is_applied_and_audited_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("review.xml");
    fs::write(&input, NEEDS_REVIEW).unwrap();
    let config = CleanConfig {
        input,
        output: Some(dir.path().join("out/clean.xml")),
        audit_log: Some(dir.path().join("out/audit.json")),
        audit_format: AuditFormat::Json,
        ..CleanConfig::default()
    };
    let mut resolver = TerminalResolver::new(Cursor::new("B\n"), Vec::new());

    let result = run_clean(&config, &mut resolver).expect("clean");

    assert_eq!(result.report.walk.escalated, 1);
    assert_eq!(result.report.summary.corrected, 1);
    let output = fs::read_to_string(dir.path().join("out/clean.xml")).unwrap();
    assert!(output.contains("<ns1:Unit>B</ns1:Unit>"));
    let audit = fs::read_to_string(dir.path().join("out/audit.json")).unwrap();
    assert!(audit.contains("corrected by operator"));
    assert!(audit.trim_start().starts_with('['));
}

#[test]
fn unreadable_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.xml");
    fs::write(&input, "<ns1:SchoolUpload xmlns:ns1=\"http://ontario.ca\"><ns1:School>").unwrap();
    let config = CleanConfig {
        input: input.clone(),
        ..CleanConfig::default()
    };

    assert!(run_clean(&config, &mut DeferResolver).is_err());
    assert!(!default_output_path(&input).exists());
    assert!(!default_audit_path(&input).exists());
}

#[test]
fn verification_reports_count_mismatch() {
    let error = verify_output(
        &fixture("sample_upload.xml"),
        &NormalizationRules::default(),
        DocumentCounts {
            schools: 2,
            students: 3,
        },
    )
    .expect_err("the uncleaned fixture still holds the empty school");
    assert!(error.to_string().contains("expected 2 schools / 3 students, found 3 / 3"));
}

#[test]
fn export_writes_csv_files() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run_export(
        &fixture("sample_upload.xml"),
        &dir.path().join("exports/board"),
        &ExportOptions {
            birth_years: vec![2008],
            grades: vec!["GR11".to_string()],
        },
        None,
        &ParseOptions::default(),
    )
    .expect("export");

    assert_eq!(summary.filtered_students, 1);
    assert_eq!(summary.filtered_schools, vec!["Hilltop Secondary"]);
    for path in [
        &summary.files.all_students,
        &summary.files.filtered_students,
        &summary.files.school_counts,
        &summary.files.grade_counts,
    ] {
        assert!(path.exists(), "{} missing", path.display());
    }
}

#[test]
fn rename_uses_standard_name_and_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let first = copy_fixture(dir.path(), "first.xml");
    let second = copy_fixture(dir.path(), "second.xml");

    let target = rename_upload(
        &first,
        SchoolLevel::Elementary,
        None,
        &ParseOptions::default(),
    )
    .expect("rename");
    assert_eq!(
        target,
        dir.path().join("20240930_B66052_elementary_STIX.xml")
    );
    assert!(target.exists());
    assert!(!first.exists());

    let error = rename_upload(
        &second,
        SchoolLevel::Elementary,
        None,
        &ParseOptions::default(),
    )
    .expect_err("target exists");
    assert!(error.to_string().contains("already exists"));
    assert!(second.exists());
}
