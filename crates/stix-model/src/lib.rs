pub mod document;
pub mod field;
pub mod record;

pub use document::{Descendants, Document, Element, NodeId, SourcePosition};
pub use field::{Decision, FieldCorrection, FieldKind, Normalized};
pub use record::{Metadata, SchoolRecord, StudentListShape, StudentRecord};
