//! Apartment/suite unit normalization.

use std::sync::LazyLock;

use regex::Regex;
use stix_model::Normalized;
use stix_standards::NormalizationRules;

/// An opening parenthesis followed somewhere later by a closing one.
static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\(.*\)").expect("Invalid parenthesis regex"));

/// The whole value is `unit` plus digits, e.g. `Unit 12`; `Unit 12B` does not match.
static UNIT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*unit\s*([0-9]+)\s*$").expect("Invalid unit prefix regex")
});

/// Outcome of normalizing a unit value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The rules settled the value.
    Resolved(Normalized),
    /// Too long and no rule applies; an operator has to decide.
    Escalate { reason: String },
}

/// Normalize a raw unit value.
///
/// Values within `unit_max_len` characters are kept, except that wrapping
/// parentheses are always stripped. Longer values go through the
/// substitution table, parenthesis stripping and `unit` prefix removal, in
/// that order, before escalating.
pub fn normalize_unit(raw: &str, rules: &NormalizationRules) -> UnitOutcome {
    if raw.chars().count() <= rules.unit_max_len {
        if PARENTHESIZED.is_match(raw) {
            return UnitOutcome::Resolved(strip_parentheses(raw));
        }
        return UnitOutcome::Resolved(Normalized::kept(raw, "within length limit"));
    }

    if let Some(substitution) = rules.unit_substitution(raw) {
        return UnitOutcome::Resolved(Normalized::corrected(
            substitution.to.clone(),
            format!("standardized '{}' to '{}'", raw.trim(), substitution.to),
        ));
    }
    if PARENTHESIZED.is_match(raw) {
        return UnitOutcome::Resolved(strip_parentheses(raw));
    }
    if let Some(captures) = UNIT_PREFIX.captures(raw) {
        return UnitOutcome::Resolved(Normalized::corrected(
            captures[1].to_string(),
            "removed 'unit' prefix",
        ));
    }
    UnitOutcome::Escalate {
        reason: format!(
            "longer than {} characters and no correction rule applies",
            rules.unit_max_len
        ),
    }
}

fn strip_parentheses(raw: &str) -> Normalized {
    let stripped: String = raw.chars().filter(|c| !matches!(c, '(' | ')')).collect();
    if stripped.trim().is_empty() {
        Normalized::cleared("only parentheses")
    } else {
        Normalized::corrected(stripped, "removed parentheses")
    }
}
