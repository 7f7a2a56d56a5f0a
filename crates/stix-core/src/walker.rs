//! Single-pass traversal that normalizes catalogued fields in place.

use stix_model::{
    Decision, Document, FieldCorrection, FieldKind, NodeId, Normalized, SourcePosition,
};
use stix_normalize::{
    StreetNumberOutcome, UnitOutcome, normalize_phone, normalize_street_number, normalize_unit,
};
use stix_standards::NormalizationRules;
use stix_standards::catalog::{self, FieldCatalog};
use tracing::{debug, info, info_span, warn};

use crate::audit::AuditLog;
use crate::resolver::{Reply, ResolutionRequest, Resolver, SiblingContext};

/// Counts of one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Catalogued fields with a non-empty value.
    pub visited: usize,
    pub kept: usize,
    pub corrected: usize,
    pub cleared: usize,
    pub flagged: usize,
    /// Fields handed to the resolver.
    pub escalated: usize,
    /// Street names replaced alongside an escalated street number.
    pub street_names_updated: usize,
}

impl WalkSummary {
    fn count(&mut self, decision: Decision) {
        match decision {
            Decision::Kept => self.kept += 1,
            Decision::Corrected => self.corrected += 1,
            Decision::Cleared => self.cleared += 1,
            Decision::FlaggedManual => self.flagged += 1,
        }
    }
}

/// The field being visited.
struct Visit {
    node: NodeId,
    kind: FieldKind,
    position: SourcePosition,
    original: String,
}

pub struct DocumentWalker<'a> {
    rules: &'a NormalizationRules,
    catalog: &'a FieldCatalog,
}

impl<'a> DocumentWalker<'a> {
    pub fn new(rules: &'a NormalizationRules, catalog: &'a FieldCatalog) -> Self {
        Self { rules, catalog }
    }

    /// Visit every attached element once, in document order.
    ///
    /// Catalogued fields are normalized and overwritten in place; every
    /// decision other than Kept is appended to `audit`. Escalations go to
    /// `resolver`; a resolver error leaves the field unchanged and flagged.
    pub fn process<R>(
        &self,
        document: &mut Document,
        resolver: &mut R,
        audit: &mut AuditLog,
    ) -> WalkSummary
    where
        R: Resolver + ?Sized,
    {
        let _span = info_span!("walk").entered();
        let mut summary = WalkSummary::default();
        let nodes: Vec<NodeId> = document.iter().collect();

        for node in nodes {
            let element = document.element(node);
            let Some(kind) = self.catalog.classify(element) else {
                if self.catalog.is_lookalike(element) {
                    debug!(
                        tag = %element.name,
                        position = %element.position,
                        "field not in catalog; left unchanged"
                    );
                }
                continue;
            };
            let Some(original) = element.text.clone().filter(|text| !text.is_empty()) else {
                continue;
            };
            let visit = Visit {
                node,
                kind,
                position: element.position.clone(),
                original,
            };
            summary.visited += 1;

            match kind {
                FieldKind::Phone => {
                    let normalized = normalize_phone(&visit.original, self.rules);
                    apply(document, &visit, normalized, audit, &mut summary);
                }
                FieldKind::Unit => match normalize_unit(&visit.original, self.rules) {
                    UnitOutcome::Resolved(normalized) => {
                        apply(document, &visit, normalized, audit, &mut summary);
                    }
                    UnitOutcome::Escalate { reason } => {
                        let context = SiblingContext {
                            street_number: self.sibling_text(
                                document,
                                node,
                                catalog::STREET_NUMBER,
                            ),
                            street_name: self.sibling_text(document, node, catalog::STREET_NAME),
                        };
                        self.escalate(
                            document,
                            &visit,
                            reason,
                            context,
                            resolver,
                            audit,
                            &mut summary,
                        );
                    }
                },
                FieldKind::StreetNumber => {
                    let street_name = self.sibling_text(document, node, catalog::STREET_NAME);
                    match normalize_street_number(&visit.original, street_name.as_deref(), self.rules)
                    {
                        StreetNumberOutcome::Resolved(normalized) => {
                            apply(document, &visit, normalized, audit, &mut summary);
                        }
                        StreetNumberOutcome::Escalate {
                            reason,
                            street_name,
                        } => {
                            let context = SiblingContext {
                                street_number: None,
                                street_name,
                            };
                            self.escalate(
                                document,
                                &visit,
                                reason,
                                context,
                                resolver,
                                audit,
                                &mut summary,
                            );
                        }
                    }
                }
                // Street names are only touched through a street-number escalation.
                FieldKind::StreetName => {}
            }
        }

        info!(
            visited = summary.visited,
            corrected = summary.corrected,
            cleared = summary.cleared,
            flagged = summary.flagged,
            escalated = summary.escalated,
            "document walk complete"
        );
        summary
    }

    #[allow(clippy::too_many_arguments)]
    fn escalate<R>(
        &self,
        document: &mut Document,
        visit: &Visit,
        reason: String,
        context: SiblingContext,
        resolver: &mut R,
        audit: &mut AuditLog,
        summary: &mut WalkSummary,
    ) where
        R: Resolver + ?Sized,
    {
        summary.escalated += 1;
        let request = ResolutionRequest {
            kind: visit.kind,
            position: visit.position.clone(),
            original: visit.original.clone(),
            reason,
            context,
        };
        let resolution = match resolver.resolve(&request) {
            Ok(resolution) => resolution,
            Err(error) => {
                warn!(
                    kind = %visit.kind,
                    position = %visit.position,
                    %error,
                    "resolver failed; field flagged for manual review"
                );
                let normalized = Normalized::flagged(
                    &visit.original,
                    format!("{}; resolver error: {error}", request.reason),
                );
                apply(document, visit, normalized, audit, summary);
                return;
            }
        };

        let normalized = match resolution.reply {
            Reply::Value(value) => {
                let value = value.trim();
                if value.is_empty() {
                    Normalized::cleared("cleared by operator")
                } else if value == visit.original {
                    // Still recorded: every escalated field leaves an audit line.
                    Normalized::corrected(value, "confirmed by operator")
                } else {
                    Normalized::corrected(value, "corrected by operator")
                }
            }
            Reply::NoReply => Normalized::flagged(
                &visit.original,
                format!("{}; requires manual review", request.reason),
            ),
        };
        apply(document, visit, normalized, audit, summary);

        if let (FieldKind::StreetNumber, Some(street_name)) = (visit.kind, resolution.street_name) {
            self.update_street_name(document, visit, street_name.trim(), audit, summary);
        }
    }

    fn update_street_name(
        &self,
        document: &mut Document,
        street_number: &Visit,
        street_name: &str,
        audit: &mut AuditLog,
        summary: &mut WalkSummary,
    ) {
        let Some(node) = self.sibling(document, street_number.node, catalog::STREET_NAME) else {
            warn!(
                position = %street_number.position,
                "no StreetName sibling to update; street name reply ignored"
            );
            return;
        };
        let original = document.text(node).unwrap_or_default().to_string();
        if street_name.is_empty() || street_name == original {
            return;
        }
        let position = document.element(node).position.clone();
        document.set_text(node, street_name);
        summary.street_names_updated += 1;
        audit.record_field(FieldCorrection::new(
            position,
            FieldKind::StreetName,
            original,
            Normalized::corrected(street_name, "updated by operator with street number"),
        ));
    }

    /// First sibling of `node` named `local`, in document order.
    fn sibling(&self, document: &Document, node: NodeId, local: &str) -> Option<NodeId> {
        let parent = document.parent(node)?;
        document.find_child(parent, |element| self.catalog.is(element, local))
    }

    fn sibling_text(&self, document: &Document, node: NodeId, local: &str) -> Option<String> {
        self.sibling(document, node, local)
            .and_then(|id| document.text(id))
            .map(str::to_string)
    }
}

fn apply(
    document: &mut Document,
    visit: &Visit,
    normalized: Normalized,
    audit: &mut AuditLog,
    summary: &mut WalkSummary,
) {
    summary.count(normalized.decision);
    if !normalized.decision.is_actionable() {
        return;
    }
    if normalized.decision != Decision::FlaggedManual {
        document.set_text(visit.node, normalized.value.clone());
    }
    audit.record_field(FieldCorrection::new(
        visit.position.clone(),
        visit.kind,
        visit.original.clone(),
        normalized,
    ));
}

#[cfg(test)]
mod tests {
    use stix_ingest::parse_document;

    use super::*;
    use crate::resolver::{DeferResolver, Resolution, ScriptedResolver};

    fn address(unit: &str, number: &str, name: &str) -> String {
        format!(
            r#"<ns1:SchoolUpload xmlns:ns1="http://ontario.ca">
  <ns1:Student>
    <ns1:Address>
      <ns1:Unit>{unit}</ns1:Unit>
      <ns1:StreetNumber>{number}</ns1:StreetNumber>
      <ns1:StreetNumberSuffix>A</ns1:StreetNumberSuffix>
      <ns1:StreetName>{name}</ns1:StreetName>
    </ns1:Address>
    <ns1:HomePhone>(905) 555-1234</ns1:HomePhone>
    <ns1:ContactPhoneExt>12</ns1:ContactPhoneExt>
  </ns1:Student>
</ns1:SchoolUpload>"#
        )
    }

    fn field_text(document: &Document, local: &str) -> Option<String> {
        document
            .iter()
            .find(|id| document.element(*id).local_name() == local)
            .and_then(|id| document.text(id).map(str::to_string))
    }

    fn walk<R: Resolver>(document: &mut Document, resolver: &mut R) -> (WalkSummary, AuditLog) {
        let rules = NormalizationRules::default();
        let catalog = FieldCatalog::from_rules(&rules);
        let mut audit = AuditLog::new();
        let summary = DocumentWalker::new(&rules, &catalog).process(document, resolver, &mut audit);
        (summary, audit)
    }

    #[test]
    fn normalizes_without_escalation() {
        let mut document = parse_document(&address("basement", "12", "King")).expect("parse");
        let mut resolver = ScriptedResolver::default();
        let (summary, audit) = walk(&mut document, &mut resolver);

        assert_eq!(field_text(&document, "Unit").as_deref(), Some("BSMT"));
        assert_eq!(field_text(&document, "HomePhone").as_deref(), Some("905-555-1234"));
        assert_eq!(field_text(&document, "ContactPhoneExt").as_deref(), Some("12"));
        assert_eq!(summary.visited, 3);
        assert_eq!(summary.kept, 1);
        assert_eq!(audit.corrections().count(), 2);
        assert!(resolver.requests().is_empty());
    }

    #[test]
    fn unit_escalation_carries_sibling_context() {
        let mut document = parse_document(&address("Apartment B", "12", "King")).expect("parse");
        let mut resolver = ScriptedResolver::new([Resolution::value("B")]);
        let (summary, audit) = walk(&mut document, &mut resolver);

        let request = &resolver.requests()[0];
        assert_eq!(request.kind, FieldKind::Unit);
        assert_eq!(request.context.street_number.as_deref(), Some("12"));
        assert_eq!(request.context.street_name.as_deref(), Some("King"));
        assert_eq!(field_text(&document, "Unit").as_deref(), Some("B"));
        assert_eq!(summary.escalated, 1);

        let unit = audit.corrections().next().expect("unit correction");
        assert_eq!(unit.decision, Decision::Corrected);
        assert_eq!(unit.original, "Apartment B");
    }

    #[test]
    fn empty_reply_clears_and_no_reply_flags() {
        let mut document = parse_document(&address("Apartment B", "12", "King")).expect("parse");
        let (_, audit) = walk(&mut document, &mut ScriptedResolver::new([Resolution::clear()]));
        assert_eq!(field_text(&document, "Unit").as_deref(), Some(""));
        assert_eq!(audit.corrections().next().map(|c| c.decision), Some(Decision::Cleared));

        let mut document = parse_document(&address("Apartment B", "12", "King")).expect("parse");
        let (summary, audit) = walk(&mut document, &mut DeferResolver);
        assert_eq!(field_text(&document, "Unit").as_deref(), Some("Apartment B"));
        assert_eq!(summary.flagged, 1);
        let flagged = audit.corrections().next().expect("flagged unit");
        assert_eq!(flagged.decision, Decision::FlaggedManual);
        assert_eq!(flagged.corrected, "Apartment B");
    }

    #[test]
    fn confirmed_value_is_still_audited() {
        let mut document = parse_document(&address("A1", "1234567", "King")).expect("parse");
        let mut resolver = ScriptedResolver::new([Resolution::value("1234567")]);
        let (summary, audit) = walk(&mut document, &mut resolver);

        assert_eq!(field_text(&document, "StreetNumber").as_deref(), Some("1234567"));
        assert_eq!(summary.escalated, 1);
        let number = audit
            .corrections()
            .find(|c| c.kind == FieldKind::StreetNumber)
            .expect("street number entry");
        assert_eq!(number.decision, Decision::Corrected);
        assert_eq!(number.corrected, "1234567");
        assert_eq!(number.reason, "confirmed by operator");
    }

    #[test]
    fn resolver_failure_flags_field() {
        let mut document = parse_document(&address("Apartment B", "12", "King")).expect("parse");
        let mut resolver = ScriptedResolver::default();
        resolver.push_failure("stdin closed");
        let (summary, audit) = walk(&mut document, &mut resolver);

        assert_eq!(field_text(&document, "Unit").as_deref(), Some("Apartment B"));
        assert_eq!(summary.flagged, 1);
        let flagged = audit.corrections().next().expect("flagged unit");
        assert!(flagged.reason.contains("stdin closed"), "{}", flagged.reason);
    }

    #[test]
    fn street_number_escalation_updates_street_name() {
        let mut document = parse_document(&address("A1", "123 Main St", "Mian")).expect("parse");
        let mut resolver =
            ScriptedResolver::new([Resolution::value("123").with_street_name("Main")]);
        let (summary, audit) = walk(&mut document, &mut resolver);

        assert_eq!(field_text(&document, "StreetNumber").as_deref(), Some("123"));
        assert_eq!(field_text(&document, "StreetName").as_deref(), Some("Main"));
        assert_eq!(summary.street_names_updated, 1);
        let kinds: Vec<FieldKind> = audit.corrections().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![FieldKind::StreetNumber, FieldKind::StreetName, FieldKind::Phone]
        );
        assert_eq!(
            resolver.requests()[0].context.street_name.as_deref(),
            Some("Mian")
        );
    }

    #[test]
    fn unchanged_street_name_is_not_recorded() {
        let mut document = parse_document(&address("A1", "123 Main St", "Main")).expect("parse");
        let mut resolver =
            ScriptedResolver::new([Resolution::value("123").with_street_name("Main")]);
        let (summary, audit) = walk(&mut document, &mut resolver);

        assert_eq!(summary.street_names_updated, 0);
        assert_eq!(audit.corrections().count(), 2);
    }

    #[test]
    fn empty_fields_are_skipped() {
        let mut document = parse_document(
            r#"<ns1:SchoolUpload xmlns:ns1="http://ontario.ca">
  <ns1:HomePhone/>
  <ns1:Unit></ns1:Unit>
</ns1:SchoolUpload>"#,
        )
        .expect("parse");
        let (summary, audit) = walk(&mut document, &mut DeferResolver);
        assert_eq!(summary, WalkSummary::default());
        assert!(audit.is_empty());
    }

    #[test]
    fn fields_outside_namespace_are_ignored() {
        let mut document = parse_document(
            r#"<ns1:SchoolUpload xmlns:ns1="http://ontario.ca" xmlns:x="urn:other">
  <x:HomePhone>5551234567</x:HomePhone>
</ns1:SchoolUpload>"#,
        )
        .expect("parse");
        let (summary, _) = walk(&mut document, &mut DeferResolver);
        assert_eq!(summary.visited, 0);
        assert_eq!(field_text(&document, "HomePhone").as_deref(), Some("5551234567"));
    }
}
