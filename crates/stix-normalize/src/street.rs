//! Street number length check.

use stix_model::Normalized;
use stix_standards::NormalizationRules;

/// Outcome of checking a street number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreetNumberOutcome {
    Resolved(Normalized),
    /// Too long to accept; carries the sibling street name so the operator
    /// can correct both fields together.
    Escalate {
        reason: String,
        street_name: Option<String>,
    },
}

/// Accept street numbers up to `street_number_max_len` characters as-is.
///
/// There is no automatic correction: anything longer is escalated.
pub fn normalize_street_number(
    raw: &str,
    sibling_street_name: Option<&str>,
    rules: &NormalizationRules,
) -> StreetNumberOutcome {
    if raw.chars().count() <= rules.street_number_max_len {
        return StreetNumberOutcome::Resolved(Normalized::kept(raw, "within length limit"));
    }
    StreetNumberOutcome::Escalate {
        reason: format!(
            "longer than {} characters",
            rules.street_number_max_len
        ),
        street_name: sibling_street_name.map(str::to_string),
    }
}
