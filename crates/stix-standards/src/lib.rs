#![deny(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod paths;
pub mod rules;

pub use crate::catalog::FieldCatalog;
pub use crate::error::RulesError;
pub use crate::paths::{RULES_ENV_VAR, resolve_rules};
pub use crate::rules::{NormalizationRules, UnitSubstitution};
