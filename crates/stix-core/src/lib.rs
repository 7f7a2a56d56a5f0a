//! Record normalization engine for STIX uploads.
//!
//! The engine walks a parsed upload, repairs or flags contact and address
//! fields, strips invalid schools, and records every decision in an
//! [`AuditLog`]. Fields the rules cannot settle are handed to a
//! [`Resolver`], usually an operator at a terminal.
//!
//! # Pipeline
//!
//! 1. **Metadata check**: missing fields become audited placeholders
//! 2. **Validation**: schools without students or a number are removed
//! 3. **Walk**: each catalogued field is normalized in document order
//!
//! # Example
//!
//! ```ignore
//! use stix_core::{AuditLog, DeferResolver, clean_document};
//!
//! let mut audit = AuditLog::new();
//! let report = clean_document(&mut document, &rules, &mut DeferResolver, &mut audit);
//! println!("{} students retained", report.counts.students);
//! ```

pub mod audit;
pub mod pipeline;
pub mod resolver;
pub mod walker;

pub use audit::{AuditEntry, AuditLog, AuditSummary};
pub use pipeline::{CleanReport, clean_document};
pub use resolver::{
    DeferResolver, Reply, Resolution, ResolutionRequest, ResolveError, Resolver,
    ScriptedResolver, SiblingContext,
};
pub use walker::{DocumentWalker, WalkSummary};
