//! STIX output generation.
//!
//! - **Cleaned XML**: pretty-printed UTF-8 serialization of the document
//! - **Audit log**: one line per decision, or JSON
//! - **CSV exports**: student lists and per-school counts
//! - **File naming**: the board's standard upload file name

mod audit;
mod export;
mod naming;
mod xml;

pub use audit::{AuditFormat, render_audit_log, write_audit_log};
pub use export::{
    ExportFiles, ExportOptions, ExportSummary, GradeCount, SchoolYearCount, birth_year,
    export_students, grade_counts, school_counts,
};
pub use naming::{SchoolLevel, standard_file_name};
pub use xml::{serialize_document, write_document, write_document_file};
