//! The `clean` pipeline over an already-parsed document.
//!
//! Reading the input and writing the output stay with the caller, so a run
//! that fails mid-way leaves nothing on disk.

use stix_ingest::{DocumentCounts, MetadataCheck, check_metadata, count_document, extract_schools};
use stix_model::Document;
use stix_standards::{FieldCatalog, NormalizationRules};
use stix_validate::{SchoolValidation, remove_schools, validate_schools};
use tracing::{info, info_span, warn};

use crate::audit::{AuditLog, AuditSummary};
use crate::resolver::Resolver;
use crate::walker::{DocumentWalker, WalkSummary};

/// Everything a caller needs to report on a clean run.
#[derive(Debug, Clone)]
pub struct CleanReport {
    pub metadata: MetadataCheck,
    pub validation: SchoolValidation,
    /// `School` elements detached from the tree.
    pub detached: usize,
    pub walk: WalkSummary,
    /// Schools and students left in the document.
    pub counts: DocumentCounts,
    pub summary: AuditSummary,
}

/// Check metadata, strip invalid schools and normalize every catalogued
/// field of `document` in place.
pub fn clean_document<R>(
    document: &mut Document,
    rules: &NormalizationRules,
    resolver: &mut R,
    audit: &mut AuditLog,
) -> CleanReport
where
    R: Resolver + ?Sized,
{
    let _span = info_span!("clean").entered();
    let catalog = FieldCatalog::from_rules(rules);

    let metadata = check_metadata(document, &catalog, rules);
    for field in &metadata.missing {
        audit.record_metadata_placeholder(field.as_str(), metadata.position.clone());
    }

    let (validation, detached) = {
        let _span = info_span!("validate").entered();
        let validation = validate_schools(extract_schools(document, &catalog));
        for removal in &validation.removed {
            audit.record_school_removed(removal);
        }
        let detached = remove_schools(document, &catalog, &validation);
        (validation, detached)
    };

    let walk = DocumentWalker::new(rules, &catalog).process(document, resolver, audit);

    let counts = count_document(document, &catalog);
    if counts.students != validation.total_students() {
        warn!(
            expected = validation.total_students(),
            actual = counts.students,
            "student count changed during the walk"
        );
    }
    let summary = audit.record_summary(counts.students);
    info!(
        schools = counts.schools,
        students = counts.students,
        removed = summary.schools_removed,
        corrected = summary.corrected,
        cleared = summary.cleared,
        flagged = summary.flagged,
        "clean complete"
    );

    CleanReport {
        metadata,
        validation,
        detached,
        walk,
        counts,
        summary,
    }
}
