//! Jurisdiction-specific normalization rules.
//!
//! Every field has a default, so a rules file only needs to name the values it
//! overrides:
//!
//! ```toml
//! invalid_area_codes = ["163", "081", "555"]
//!
//! [[unit_substitutions]]
//! from = "rear"
//! to = "REAR"
//! ```

#![deny(unsafe_code)]

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RulesError;

/// Namespace of the Ontario STIX upload schema.
pub const DEFAULT_NAMESPACE: &str = "http://ontario.ca";

/// Ordered exact-match replacement for an overlong unit designator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSubstitution {
    /// Matched case-insensitively against the whole value.
    pub from: String,
    pub to: String,
}

impl UnitSubstitution {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationRules {
    /// Namespace URI the catalogued fields must resolve to. Empty matches by
    /// local name only.
    pub namespace: String,
    /// Units longer than this (in characters) go through the correction table.
    pub unit_max_len: usize,
    /// Street numbers longer than this are escalated to the operator.
    pub street_number_max_len: usize,
    pub invalid_area_codes: Vec<String>,
    /// Known filler numbers, in canonical `DDD-DDD-DDDD` form.
    pub placeholder_numbers: Vec<String>,
    /// Local names of the phone-bearing fields.
    pub phone_fields: Vec<String>,
    pub unit_substitutions: Vec<UnitSubstitution>,
    /// Metadata fields that must be present, `/`-separated below `Metadata`.
    pub required_metadata: Vec<String>,
}

impl Default for NormalizationRules {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            unit_max_len: 5,
            street_number_max_len: 6,
            invalid_area_codes: vec!["163".to_string(), "081".to_string()],
            placeholder_numbers: vec!["519-000-0000".to_string()],
            phone_fields: [
                "Phone",
                "HomePhone",
                "WorkPhone",
                "CellPhone",
                "EmergencyPhone",
                "ContactPhone",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            unit_substitutions: vec![
                UnitSubstitution::new("basement", "BSMT"),
                UnitSubstitution::new("lower un", "LOWR"),
                UnitSubstitution::new("d lower", "LOWR"),
                UnitSubstitution::new("upperlev", "UPPR"),
                UnitSubstitution::new("main flo", "MAIN"),
                UnitSubstitution::new("mainfloo", "MAIN"),
            ],
            required_metadata: [
                "CreateDate",
                "CreateTime",
                "CreatedBy",
                "ContactNumber",
                "ContactEmail",
                "FullUpload",
                "SchoolBoard",
                "SchoolBoard/BoardNumber",
                "SchoolBoard/Name",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl NormalizationRules {
    /// Parse and validate rules from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, RulesError> {
        let rules: Self = toml::from_str(text).map_err(|source| RulesError::Toml {
            path: "<inline>".into(),
            source,
        })?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load and validate a rules file.
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        let text = std::fs::read_to_string(path).map_err(|e| RulesError::io(path, e))?;
        let rules: Self = toml::from_str(&text).map_err(|source| RulesError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        rules.validate()?;
        tracing::debug!(path = %path.display(), "loaded normalization rules");
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        if self.unit_max_len == 0 {
            return Err(RulesError::invalid("unit_max_len must be at least 1"));
        }
        if self.street_number_max_len == 0 {
            return Err(RulesError::invalid("street_number_max_len must be at least 1"));
        }
        for code in &self.invalid_area_codes {
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_digit()) {
                return Err(RulesError::invalid(format!(
                    "invalid area code '{code}': expected three digits"
                )));
            }
        }
        for number in &self.placeholder_numbers {
            if !is_canonical_phone(number) {
                return Err(RulesError::invalid(format!(
                    "placeholder number '{number}' is not in DDD-DDD-DDDD form"
                )));
            }
        }
        let mut seen = BTreeSet::new();
        for substitution in &self.unit_substitutions {
            let key = substitution.from.to_lowercase();
            if key.trim().is_empty() {
                return Err(RulesError::invalid("unit substitution with empty 'from'"));
            }
            if !seen.insert(key) {
                tracing::warn!(
                    from = %substitution.from,
                    "duplicate unit substitution; the first entry wins"
                );
            }
        }
        if self.phone_fields.iter().any(|name| name.trim().is_empty()) {
            return Err(RulesError::invalid("empty phone field name"));
        }
        Ok(())
    }

    /// Replacement for `raw` from the unit table, first match wins.
    pub fn unit_substitution(&self, raw: &str) -> Option<&UnitSubstitution> {
        let lowered = raw.to_lowercase();
        self.unit_substitutions
            .iter()
            .find(|substitution| substitution.from.to_lowercase() == lowered)
    }

    pub fn is_invalid_area_code(&self, area_code: &str) -> bool {
        self.invalid_area_codes.iter().any(|code| code == area_code)
    }

    pub fn is_placeholder_number(&self, formatted: &str) -> bool {
        self.placeholder_numbers
            .iter()
            .any(|number| number == formatted)
    }
}

fn is_canonical_phone(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 12
        && bytes.iter().enumerate().all(|(idx, b)| match idx {
            3 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let rules = NormalizationRules::default();
        rules.validate().expect("default rules validate");
        assert_eq!(rules.unit_max_len, 5);
        assert_eq!(rules.street_number_max_len, 6);
        assert!(rules.is_invalid_area_code("163"));
        assert!(rules.is_placeholder_number("519-000-0000"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let rules = NormalizationRules::from_toml_str(
            r#"
invalid_area_codes = ["555"]
unit_max_len = 4
"#,
        )
        .expect("parse rules");
        assert_eq!(rules.invalid_area_codes, vec!["555".to_string()]);
        assert_eq!(rules.unit_max_len, 4);
        assert_eq!(rules.street_number_max_len, 6);
        assert_eq!(rules.unit_substitutions.len(), 6);
    }

    #[test]
    fn unit_substitution_is_case_insensitive_and_ordered() {
        let rules = NormalizationRules::default();
        assert_eq!(
            rules.unit_substitution("BaseMent").map(|s| s.to.as_str()),
            Some("BSMT")
        );
        assert_eq!(
            rules.unit_substitution("Main Flo").map(|s| s.to.as_str()),
            Some("MAIN")
        );
        assert!(rules.unit_substitution("basement ").is_none());
    }

    #[test]
    fn rejects_bad_area_code() {
        let err = NormalizationRules::from_toml_str(r#"invalid_area_codes = ["12"]"#)
            .expect_err("two-digit area code");
        assert!(matches!(err, RulesError::Invalid { .. }));
    }

    #[test]
    fn rejects_non_canonical_placeholder() {
        let err = NormalizationRules::from_toml_str(r#"placeholder_numbers = ["5190000000"]"#)
            .expect_err("unformatted placeholder");
        assert!(err.to_string().contains("5190000000"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = NormalizationRules::from_toml_str("unit_max = 3").expect_err("unknown key");
        assert!(matches!(err, RulesError::Toml { .. }));
    }
}
