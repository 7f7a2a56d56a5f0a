//! Clean pipeline scenarios over whole uploads.

use std::path::PathBuf;

use stix_core::{AuditEntry, AuditLog, DeferResolver, Resolution, ScriptedResolver, clean_document};
use stix_ingest::{ParseOptions, extract_schools, parse_document, read_document};
use stix_model::{Decision, FieldKind};
use stix_standards::{FieldCatalog, NormalizationRules};

const TWO_SCHOOLS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ns1:SchoolUpload xmlns:ns1="http://ontario.ca">
  <ns1:Metadata>
    <ns1:CreateDate>2024-09-30</ns1:CreateDate>
    <ns1:CreateTime>08:00:00</ns1:CreateTime>
    <ns1:CreatedBy>Registrar</ns1:CreatedBy>
    <ns1:ContactNumber>905-555-0100</ns1:ContactNumber>
    <ns1:ContactEmail>office@example.org</ns1:ContactEmail>
    <ns1:FullUpload>Y</ns1:FullUpload>
    <ns1:SchoolBoard>
      <ns1:BoardNumber>B66052</ns1:BoardNumber>
      <ns1:Name>Example DSB</ns1:Name>
    </ns1:SchoolBoard>
  </ns1:Metadata>
  <ns1:School>
    <ns1:SchoolNumber>500</ns1:SchoolNumber>
    <ns1:Name>Empty Annex</ns1:Name>
    <ns1:Students/>
  </ns1:School>
  <ns1:School>
    <ns1:SchoolNumber>600</ns1:SchoolNumber>
    <ns1:Name>Lakeview</ns1:Name>
    <ns1:Students>
      <ns1:Student>
        <ns1:Name><ns1:First>Ada</ns1:First><ns1:Last>Lovelace</ns1:Last></ns1:Name>
        <ns1:Address>
          <ns1:Unit>(B)</ns1:Unit>
          <ns1:StreetNumber>12</ns1:StreetNumber>
          <ns1:StreetName>King</ns1:StreetName>
        </ns1:Address>
        <ns1:HomePhone>1-905-555-1234x12</ns1:HomePhone>
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

fn text_of(document: &stix_model::Document, local: &str) -> Vec<String> {
    document
        .iter()
        .filter(|id| document.element(*id).local_name() == local)
        .map(|id| document.text(id).unwrap_or_default().to_string())
        .collect()
}

#[test]
fn end_to_end_two_schools() {
    let mut document = parse_document(TWO_SCHOOLS).expect("parse");
    let mut audit = AuditLog::new();
    let mut resolver = ScriptedResolver::default();
    let report = clean_document(
        &mut document,
        &NormalizationRules::default(),
        &mut resolver,
        &mut audit,
    );

    let schools = extract_schools(&document, &FieldCatalog::default());
    assert_eq!(schools.len(), 1);
    assert_eq!(schools[0].school_number, "600");
    assert_eq!(text_of(&document, "HomePhone"), vec!["905-555-1234x12"]);
    assert_eq!(text_of(&document, "Unit"), vec!["B"]);

    let corrections: Vec<(FieldKind, &str, Decision)> = audit
        .corrections()
        .map(|c| (c.kind, c.corrected.as_str(), c.decision))
        .collect();
    assert_eq!(
        corrections,
        vec![
            (FieldKind::Unit, "B", Decision::Corrected),
            (FieldKind::Phone, "905-555-1234x12", Decision::Corrected),
        ]
    );
    let removals: Vec<&str> = audit
        .entries()
        .iter()
        .filter_map(|entry| match entry {
            AuditEntry::SchoolRemoved { school_number, .. } => Some(school_number.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(removals, vec!["500"]);
    // Two corrections, one removal and the closing summary.
    assert_eq!(audit.len(), 4);

    assert!(report.metadata.is_complete());
    assert_eq!(report.detached, 1);
    assert_eq!(report.counts.students, 1);
    assert_eq!(report.summary.schools_removed, 1);
    assert!(resolver.requests().is_empty());
}

#[test]
fn sample_upload_in_batch_mode() {
    let mut document =
        read_document(&fixture("sample_upload.xml"), &ParseOptions::default()).expect("read");
    let mut audit = AuditLog::new();
    let report = clean_document(
        &mut document,
        &NormalizationRules::default(),
        &mut DeferResolver,
        &mut audit,
    );

    assert_eq!(report.counts.schools, 2);
    assert_eq!(report.counts.students, 3);
    assert_eq!(report.summary.schools_removed, 1);
    assert_eq!(report.summary.corrected, 4);
    assert_eq!(report.summary.cleared, 2);
    assert_eq!(report.summary.flagged, 0);
    assert_eq!(
        text_of(&document, "Unit"),
        vec!["BSMT", "A1", "12"]
    );
    assert_eq!(
        text_of(&document, "HomePhone"),
        vec!["905-555-1234", "", ""]
    );
    assert_eq!(text_of(&document, "WorkPhone"), vec!["905-555-9876x12"]);
    assert_eq!(text_of(&document, "StreetNumberSuffix"), vec!["A"]);
}

#[test]
fn missing_metadata_is_audited_not_fatal() {
    let mut document = parse_document(
        r#"<ns1:SchoolUpload xmlns:ns1="http://ontario.ca">
  <ns1:School>
    <ns1:SchoolNumber>1</ns1:SchoolNumber>
    <ns1:Students><ns1:Student/></ns1:Students>
  </ns1:School>
</ns1:SchoolUpload>"#,
    )
    .expect("parse");
    let mut audit = AuditLog::new();
    let report = clean_document(
        &mut document,
        &NormalizationRules::default(),
        &mut DeferResolver,
        &mut audit,
    );

    let placeholders = audit
        .entries()
        .iter()
        .filter(|entry| matches!(entry, AuditEntry::MetadataPlaceholder { .. }))
        .count();
    assert_eq!(placeholders, 9);
    assert_eq!(report.metadata.metadata.board_number, "");
    assert_eq!(report.counts.students, 1);
}

#[test]
fn operator_replies_reach_the_document() {
    let mut document = parse_document(
        r#"<ns1:SchoolUpload xmlns:ns1="http://ontario.ca">
  <ns1:School>
    <ns1:SchoolNumber>1</ns1:SchoolNumber>
    <ns1:Students>
      <ns1:Student>
        <ns1:Address>
          <ns1:Unit>Apartment B</ns1:Unit>
          <ns1:StreetNumber>123 Main St</ns1:StreetNumber>
          <ns1:StreetName>Mian</ns1:StreetName>
        </ns1:Address>
      </ns1:Student>
    </ns1:Students>
  </ns1:School>
</ns1:SchoolUpload>"#,
    )
    .expect("parse");
    let mut audit = AuditLog::new();
    let mut resolver = ScriptedResolver::new([
        Resolution::value("B"),
        Resolution::value("123").with_street_name("Main"),
    ]);
    let report = clean_document(
        &mut document,
        &NormalizationRules::default(),
        &mut resolver,
        &mut audit,
    );

    assert_eq!(text_of(&document, "Unit"), vec!["B"]);
    assert_eq!(text_of(&document, "StreetNumber"), vec!["123"]);
    assert_eq!(text_of(&document, "StreetName"), vec!["Main"]);
    assert_eq!(report.walk.escalated, 2);
    assert_eq!(report.summary.corrected, 3);
    assert_eq!(resolver.remaining(), 0);
}
