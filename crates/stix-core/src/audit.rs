//! Append-only audit log of normalization and removal decisions.
//!
//! The log is owned by the running pipeline and passed explicitly to the
//! components that write to it. Entries are never edited once appended.

use std::fmt;

use serde::Serialize;
use stix_model::{Decision, FieldCorrection, SourcePosition};
use stix_validate::SchoolRemoval;
use tracing::debug;

/// Totals written at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub schools_removed: usize,
    pub students_retained: usize,
    pub corrected: usize,
    pub cleared: usize,
    pub flagged: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum AuditEntry {
    Field(FieldCorrection),
    SchoolRemoved {
        school_number: String,
        position: SourcePosition,
        reason: String,
    },
    MetadataPlaceholder {
        field: String,
        position: Option<SourcePosition>,
    },
    Summary(AuditSummary),
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(correction) => fmt::Display::fmt(correction, f),
            Self::SchoolRemoved {
                school_number,
                position,
                reason,
            } => write!(f, "{position} | School | '{school_number}' | REMOVED | {reason}"),
            Self::MetadataPlaceholder { field, position } => {
                let position = position
                    .as_ref()
                    .map_or_else(|| "document".to_string(), ToString::to_string);
                write!(
                    f,
                    "{position} | Metadata | '{field}' | PLACEHOLDER | missing, using empty value"
                )
            }
            Self::Summary(summary) => write!(
                f,
                "SUMMARY | schools removed: {} | students retained: {} | corrected: {} | cleared: {} | flagged for review: {}",
                summary.schools_removed,
                summary.students_retained,
                summary.corrected,
                summary.cleared,
                summary.flagged
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_field(&mut self, correction: FieldCorrection) {
        debug!(
            position = %correction.position,
            kind = %correction.kind,
            decision = %correction.decision,
            "audit field decision"
        );
        self.entries.push(AuditEntry::Field(correction));
    }

    pub fn record_school_removed(&mut self, removal: &SchoolRemoval) {
        self.entries.push(AuditEntry::SchoolRemoved {
            school_number: removal.school_number.clone(),
            position: removal.position.clone(),
            reason: removal.reason.to_string(),
        });
    }

    pub fn record_metadata_placeholder(
        &mut self,
        field: impl Into<String>,
        position: Option<SourcePosition>,
    ) {
        self.entries.push(AuditEntry::MetadataPlaceholder {
            field: field.into(),
            position,
        });
    }

    /// Summarize the entries so far and append the summary.
    pub fn record_summary(&mut self, students_retained: usize) -> AuditSummary {
        let summary = self.summarize(students_retained);
        self.entries.push(AuditEntry::Summary(summary));
        summary
    }

    pub fn summarize(&self, students_retained: usize) -> AuditSummary {
        let mut summary = AuditSummary {
            students_retained,
            ..AuditSummary::default()
        };
        for entry in &self.entries {
            match entry {
                AuditEntry::Field(correction) => match correction.decision {
                    Decision::Corrected => summary.corrected += 1,
                    Decision::Cleared => summary.cleared += 1,
                    Decision::FlaggedManual => summary.flagged += 1,
                    Decision::Kept => {}
                },
                AuditEntry::SchoolRemoved { .. } => summary.schools_removed += 1,
                AuditEntry::MetadataPlaceholder { .. } | AuditEntry::Summary(_) => {}
            }
        }
        summary
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn corrections(&self) -> impl Iterator<Item = &FieldCorrection> {
        self.entries.iter().filter_map(|entry| match entry {
            AuditEntry::Field(correction) => Some(correction),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One line per entry, in append order.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(ToString::to_string)
    }
}
