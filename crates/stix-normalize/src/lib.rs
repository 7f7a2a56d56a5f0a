//! Field normalization rules.
//!
//! Pure functions that validate and correct a single field value given the
//! [`NormalizationRules`] and, where needed, minimal sibling context. No I/O:
//! values the rules cannot settle come back as an escalation for the caller
//! to route to an operator.
//!
//! [`NormalizationRules`]: stix_standards::NormalizationRules

mod phone;
mod street;
mod unit;

pub use phone::normalize_phone;
pub use street::{StreetNumberOutcome, normalize_street_number};
pub use unit::{UnitOutcome, normalize_unit};
