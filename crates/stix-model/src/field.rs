//! Field kinds, normalization decisions, and correction records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::SourcePosition;

/// Contact/address fields the normalizer acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Phone,
    Unit,
    StreetNumber,
    /// Only recorded as the side effect of a street-number escalation.
    StreetName,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phone => "Phone",
            Self::Unit => "Unit",
            Self::StreetNumber => "StreetNumber",
            Self::StreetName => "StreetName",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single field visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Decision {
    Kept,
    Corrected,
    Cleared,
    /// Original retained; a human must review the field.
    FlaggedManual,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kept => "KEPT",
            Self::Corrected => "CORRECTED",
            Self::Cleared => "CLEARED",
            Self::FlaggedManual => "FLAGGED_MANUAL",
        }
    }

    /// Kept visits are not written to the audit log.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::Kept)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value produced by a normalization rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalized {
    pub value: String,
    pub decision: Decision,
    pub reason: String,
}

impl Normalized {
    pub fn kept(raw: &str, reason: impl Into<String>) -> Self {
        Self {
            value: raw.to_string(),
            decision: Decision::Kept,
            reason: reason.into(),
        }
    }

    pub fn corrected(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            decision: Decision::Corrected,
            reason: reason.into(),
        }
    }

    pub fn cleared(reason: impl Into<String>) -> Self {
        Self {
            value: String::new(),
            decision: Decision::Cleared,
            reason: reason.into(),
        }
    }

    pub fn flagged(raw: &str, reason: impl Into<String>) -> Self {
        Self {
            value: raw.to_string(),
            decision: Decision::FlaggedManual,
            reason: reason.into(),
        }
    }
}

/// One audited change (or flag) applied to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCorrection {
    pub position: SourcePosition,
    pub kind: FieldKind,
    pub original: String,
    pub corrected: String,
    pub decision: Decision,
    pub reason: String,
}

impl FieldCorrection {
    pub fn new(
        position: SourcePosition,
        kind: FieldKind,
        original: impl Into<String>,
        normalized: Normalized,
    ) -> Self {
        Self {
            position,
            kind,
            original: original.into(),
            corrected: normalized.value,
            decision: normalized.decision,
            reason: normalized.reason,
        }
    }
}

impl fmt::Display for FieldCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | '{}' -> '{}' | {} | {}",
            self.position, self.kind, self.original, self.corrected, self.decision, self.reason
        )
    }
}
