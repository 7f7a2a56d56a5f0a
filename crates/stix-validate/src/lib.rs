//! School record validation.
//!
//! A school without students, or without a school number, is structurally
//! invalid: it is reported, removed from the document tree and excluded from
//! the student totals.

mod schools;

pub use schools::{
    RemovalReason, SchoolRemoval, SchoolValidation, remove_schools, validate_schools,
};
