use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use stix_model::{Document, NodeId, SchoolRecord, SourcePosition, StudentListShape};
use stix_standards::catalog::{self, FieldCatalog};
use tracing::{debug, info, warn};

/// Why a school was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemovalReason {
    /// `Students` is present but holds no `Student` elements.
    NoStudents,
    StudentListMissing,
    StudentListNotACollection,
    MissingSchoolNumber,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoStudents => "no students",
            Self::StudentListMissing => "student list missing",
            Self::StudentListNotACollection => "student list is not a collection",
            Self::MissingSchoolNumber => "school number missing",
        }
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One removal decision. Schools sharing a number are reported once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchoolRemoval {
    /// Empty for [`RemovalReason::MissingSchoolNumber`].
    pub school_number: String,
    pub name: String,
    pub position: SourcePosition,
    pub reason: RemovalReason,
    /// The first offending `School` element.
    #[serde(skip)]
    pub node: NodeId,
}

#[derive(Debug, Clone, Default)]
pub struct SchoolValidation {
    /// Retained schools, in document order.
    pub valid: Vec<SchoolRecord>,
    /// Removals in first-seen order.
    pub removed: Vec<SchoolRemoval>,
}

impl SchoolValidation {
    /// Students across retained schools only.
    pub fn total_students(&self) -> usize {
        self.valid.iter().map(SchoolRecord::student_count).sum()
    }

    /// Deduplicated non-empty numbers of removed schools.
    pub fn removed_numbers(&self) -> BTreeSet<&str> {
        self.removed
            .iter()
            .map(|removal| removal.school_number.as_str())
            .filter(|number| !number.is_empty())
            .collect()
    }
}

/// Split school records into retained and removed. The tree itself is
/// changed by [`remove_schools`].
pub fn validate_schools(records: Vec<SchoolRecord>) -> SchoolValidation {
    let mut removed: Vec<SchoolRemoval> = Vec::new();
    let mut seen = BTreeSet::new();
    let mut candidates = Vec::with_capacity(records.len());

    for record in records {
        let reason = if record.school_number.is_empty() {
            Some(RemovalReason::MissingSchoolNumber)
        } else {
            match record.student_list {
                StudentListShape::Absent => Some(RemovalReason::StudentListMissing),
                StudentListShape::NotACollection => Some(RemovalReason::StudentListNotACollection),
                StudentListShape::Present if record.students.is_empty() => {
                    Some(RemovalReason::NoStudents)
                }
                StudentListShape::Present => None,
            }
        };
        let Some(reason) = reason else {
            candidates.push(record);
            continue;
        };
        let duplicate =
            !record.school_number.is_empty() && !seen.insert(record.school_number.clone());
        if duplicate {
            debug!(
                school_number = %record.school_number,
                "school number already scheduled for removal"
            );
            continue;
        }
        removed.push(SchoolRemoval {
            school_number: record.school_number,
            name: record.name,
            position: record.position,
            reason,
            node: record.node,
        });
    }

    // Removal deletes every School with a removed number, so a populated
    // school sharing that number goes too.
    let (valid, shadowed): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|record| !seen.contains(&record.school_number));
    for record in &shadowed {
        warn!(
            school_number = %record.school_number,
            students = record.student_count(),
            "school shares its number with an invalid school and will be removed"
        );
    }

    let validation = SchoolValidation { valid, removed };
    info!(
        retained = validation.valid.len(),
        removed = validation.removed.len(),
        students = validation.total_students(),
        "validated school records"
    );
    validation
}

/// Delete the removed schools from the tree.
///
/// Every attached `School` whose trimmed `SchoolNumber` matches a removed
/// number is detached, as is each removed school without a number. Returns
/// the number of elements detached.
pub fn remove_schools(
    document: &mut Document,
    catalog: &FieldCatalog,
    validation: &SchoolValidation,
) -> usize {
    let numbers = validation.removed_numbers();
    let mut targets: Vec<NodeId> = document
        .iter()
        .filter(|id| catalog.is(document.element(*id), catalog::SCHOOL))
        .filter(|id| {
            document
                .find_child(*id, |element| catalog.is(element, catalog::SCHOOL_NUMBER))
                .and_then(|number| document.text(number))
                .map(str::trim)
                .is_some_and(|number| numbers.contains(number))
        })
        .collect();
    targets.extend(
        validation
            .removed
            .iter()
            .filter(|removal| removal.reason == RemovalReason::MissingSchoolNumber)
            .map(|removal| removal.node),
    );

    let mut detached = 0;
    for id in targets {
        if document.detach(id) {
            detached += 1;
        }
    }
    for removal in &validation.removed {
        info!(
            school_number = %removal.school_number,
            position = %removal.position,
            reason = %removal.reason,
            "removed school"
        );
    }
    detached
}
