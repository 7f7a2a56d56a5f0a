//! Upload metadata checks.

use stix_model::{Document, Metadata, NodeId, SourcePosition};
use stix_standards::catalog::{self, FieldCatalog};
use stix_standards::NormalizationRules;
use tracing::warn;

/// Result of checking the metadata block.
#[derive(Debug, Clone, Default)]
pub struct MetadataCheck {
    /// Extracted metadata; missing fields hold empty placeholders.
    pub metadata: Metadata,
    /// Required field paths that were missing, in rule order.
    pub missing: Vec<String>,
    /// Position of the `Metadata` element, or of the root when absent.
    pub position: Option<SourcePosition>,
}

impl MetadataCheck {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check the `Metadata` block below the root for the required fields.
///
/// Missing fields never fail the run: each is reported with a warning and
/// left as an empty string in [`MetadataCheck::metadata`].
pub fn check_metadata(
    document: &Document,
    catalog: &FieldCatalog,
    rules: &NormalizationRules,
) -> MetadataCheck {
    let Some(root) = document.root() else {
        return MetadataCheck::default();
    };
    let block = document.find_child(root, |element| catalog.is(element, catalog::METADATA));
    let position = Some(document.element(block.unwrap_or(root)).position.clone());

    let mut metadata = Metadata::default();
    let mut missing = Vec::new();
    for field in &rules.required_metadata {
        let found = block.and_then(|block| find_path(document, catalog, block, field));
        if found.is_none() {
            warn!(field = %field, "metadata is missing required field; using empty placeholder");
            missing.push(field.clone());
        }
    }
    if let Some(block) = block {
        let value = |path: &str| {
            find_path(document, catalog, block, path)
                .and_then(|id| document.text(id))
                .map(|text| text.trim().to_string())
                .unwrap_or_default()
        };
        metadata = Metadata {
            create_date: value("CreateDate"),
            create_time: value("CreateTime"),
            created_by: value("CreatedBy"),
            contact_number: value("ContactNumber"),
            contact_email: value("ContactEmail"),
            full_upload: value("FullUpload"),
            board_number: value("SchoolBoard/BoardNumber"),
            board_name: value("SchoolBoard/Name"),
        };
    }
    MetadataCheck {
        metadata,
        missing,
        position,
    }
}

fn find_path(
    document: &Document,
    catalog: &FieldCatalog,
    from: NodeId,
    path: &str,
) -> Option<NodeId> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .try_fold(from, |current, segment| {
            document.find_child(current, |element| catalog.is(element, segment))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_document;

    fn check(xml: &str) -> MetadataCheck {
        let document = parse_document(xml).expect("parse");
        check_metadata(
            &document,
            &FieldCatalog::default(),
            &NormalizationRules::default(),
        )
    }

    #[test]
    fn complete_metadata() {
        let result = check(
            r#"<ns1:SchoolUpload xmlns:ns1="http://ontario.ca">
  <ns1:Metadata>
    <ns1:CreateDate>2024-09-30</ns1:CreateDate>
    <ns1:CreateTime>10:15:00</ns1:CreateTime>
    <ns1:CreatedBy>Registrar</ns1:CreatedBy>
    <ns1:ContactNumber>905-555-0100</ns1:ContactNumber>
    <ns1:ContactEmail>office@example.org</ns1:ContactEmail>
    <ns1:FullUpload>Y</ns1:FullUpload>
    <ns1:SchoolBoard>
      <ns1:BoardNumber>B66052</ns1:BoardNumber>
      <ns1:Name>Example DSB</ns1:Name>
    </ns1:SchoolBoard>
  </ns1:Metadata>
</ns1:SchoolUpload>"#,
        );
        assert!(result.is_complete(), "{:?}", result.missing);
        assert_eq!(result.metadata.board_number, "B66052");
        assert_eq!(result.metadata.board_name, "Example DSB");
        assert_eq!(result.metadata.create_date, "2024-09-30");
        assert_eq!(result.position.map(|p| p.line), Some(2));
    }

    #[test]
    fn missing_fields_get_placeholders() {
        let result = check(
            r#"<ns1:SchoolUpload xmlns:ns1="http://ontario.ca">
  <ns1:Metadata>
    <ns1:CreateDate>2024-09-30</ns1:CreateDate>
    <ns1:SchoolBoard><ns1:Name>Example DSB</ns1:Name></ns1:SchoolBoard>
  </ns1:Metadata>
</ns1:SchoolUpload>"#,
        );
        assert_eq!(
            result.missing,
            vec![
                "CreateTime",
                "CreatedBy",
                "ContactNumber",
                "ContactEmail",
                "FullUpload",
                "SchoolBoard/BoardNumber",
            ]
        );
        assert_eq!(result.metadata.board_number, "");
        assert_eq!(result.metadata.create_date, "2024-09-30");
    }

    #[test]
    fn absent_block_reports_every_field() {
        let result = check(r#"<ns1:SchoolUpload xmlns:ns1="http://ontario.ca"/>"#);
        assert_eq!(
            result.missing.len(),
            NormalizationRules::default().required_metadata.len()
        );
        assert_eq!(result.metadata, Metadata::default());
    }
}
