//! Explicit, namespace-resolved field names of the STIX upload schema.
//!
//! Fields are dispatched by exact local name within the schema namespace.
//! Look-alike tags (`ContactPhoneExt`, `StreetNumberSuffix`) are not
//! catalogued and are never normalized.

#![deny(unsafe_code)]

use std::collections::BTreeSet;

use stix_model::{Element, FieldKind};

use crate::rules::NormalizationRules;

pub const SCHOOL_UPLOAD: &str = "SchoolUpload";
pub const METADATA: &str = "Metadata";
pub const SCHOOL: &str = "School";
pub const SCHOOL_NUMBER: &str = "SchoolNumber";
pub const NAME: &str = "Name";
pub const STUDENTS: &str = "Students";
pub const STUDENT: &str = "Student";
pub const ALIAS_NAME: &str = "AliasName";
pub const ADDRESS: &str = "Address";
pub const UNIT: &str = "Unit";
pub const STREET_NUMBER: &str = "StreetNumber";
pub const STREET_NAME: &str = "StreetName";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCatalog {
    namespace: Option<String>,
    phone_fields: BTreeSet<String>,
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::from_rules(&NormalizationRules::default())
    }
}

impl FieldCatalog {
    pub fn from_rules(rules: &NormalizationRules) -> Self {
        let namespace = Some(rules.namespace.trim())
            .filter(|ns| !ns.is_empty())
            .map(str::to_string);
        Self {
            namespace,
            phone_fields: rules.phone_fields.iter().cloned().collect(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether `element` belongs to the schema namespace.
    pub fn in_namespace(&self, element: &Element) -> bool {
        match &self.namespace {
            Some(expected) => element.namespace.as_deref() == Some(expected.as_str()),
            None => true,
        }
    }

    /// Whether `element` is the schema field `local`.
    pub fn is(&self, element: &Element, local: &str) -> bool {
        element.local_name() == local && self.in_namespace(element)
    }

    /// Field kind the walker should normalize `element` as, if any.
    pub fn classify(&self, element: &Element) -> Option<FieldKind> {
        if !self.in_namespace(element) {
            return None;
        }
        let local = element.local_name();
        if local == UNIT {
            Some(FieldKind::Unit)
        } else if local == STREET_NUMBER {
            Some(FieldKind::StreetNumber)
        } else if self.phone_fields.contains(local) {
            Some(FieldKind::Phone)
        } else {
            None
        }
    }

    pub fn is_phone(&self, element: &Element) -> bool {
        self.classify(element) == Some(FieldKind::Phone)
    }

    /// Tags that share a catalogued name as a substring but are not
    /// catalogued themselves.
    pub fn is_lookalike(&self, element: &Element) -> bool {
        if self.classify(element).is_some() {
            return false;
        }
        let local = element.local_name();
        local != STREET_NAME
            && (local.contains("Phone") || local.contains(UNIT) || local.contains(STREET_NUMBER))
    }
}

#[cfg(test)]
mod tests {
    use stix_model::SourcePosition;

    use super::*;

    fn element(name: &str, namespace: Option<&str>) -> Element {
        let element = Element::new(name, SourcePosition::new(1, "/x"));
        match namespace {
            Some(ns) => element.with_namespace(ns),
            None => element,
        }
    }

    #[test]
    fn classifies_catalogued_fields() {
        let catalog = FieldCatalog::default();
        let ns = Some("http://ontario.ca");
        assert_eq!(
            catalog.classify(&element("ns1:HomePhone", ns)),
            Some(FieldKind::Phone)
        );
        assert_eq!(
            catalog.classify(&element("ns1:Unit", ns)),
            Some(FieldKind::Unit)
        );
        assert_eq!(
            catalog.classify(&element("ns1:StreetNumber", ns)),
            Some(FieldKind::StreetNumber)
        );
    }

    #[test]
    fn lookalikes_are_not_classified() {
        let catalog = FieldCatalog::default();
        let ns = Some("http://ontario.ca");
        let suffix = element("ns1:StreetNumberSuffix", ns);
        let extension = element("ns1:ContactPhoneExt", ns);
        assert_eq!(catalog.classify(&suffix), None);
        assert_eq!(catalog.classify(&extension), None);
        assert!(catalog.is_lookalike(&suffix));
        assert!(catalog.is_lookalike(&extension));
        assert!(!catalog.is_lookalike(&element("ns1:StreetName", ns)));
    }

    #[test]
    fn foreign_namespace_is_ignored() {
        let catalog = FieldCatalog::default();
        assert_eq!(
            catalog.classify(&element("x:Phone", Some("urn:other"))),
            None
        );
        assert_eq!(catalog.classify(&element("Phone", None)), None);
    }

    #[test]
    fn empty_namespace_matches_local_names() {
        let rules = NormalizationRules {
            namespace: String::new(),
            ..NormalizationRules::default()
        };
        let catalog = FieldCatalog::from_rules(&rules);
        assert_eq!(
            catalog.classify(&element("Phone", None)),
            Some(FieldKind::Phone)
        );
        assert!(catalog.is(&element("a:School", Some("urn:any")), SCHOOL));
    }
}
