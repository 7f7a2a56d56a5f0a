//! STIX upload ingestion.
//!
//! This crate turns raw upload bytes into the arena [`Document`] the
//! normalization pipeline works on, and reads flat records back out of it.
//!
//! # Features
//!
//! - **Decoding**: BOM, declared encoding, or the feed's windows-1252 default
//! - **Tree building**: `quick-xml` events into a [`Document`] with line numbers
//!   and element paths, plus an optional fragment-wrapping recovery pass
//! - **Metadata check**: required upload metadata with empty placeholders
//! - **Extraction**: [`SchoolRecord`] / [`StudentRecord`] lists and counts
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use stix_ingest::{ParseOptions, extract_schools, read_document};
//! use stix_standards::FieldCatalog;
//!
//! let document = read_document(Path::new("upload.xml"), &ParseOptions::default())?;
//! let schools = extract_schools(&document, &FieldCatalog::default());
//! ```
//!
//! [`Document`]: stix_model::Document
//! [`SchoolRecord`]: stix_model::SchoolRecord
//! [`StudentRecord`]: stix_model::StudentRecord

mod decode;
mod error;
mod extract;
mod metadata;
mod parse;

pub use decode::{DecodedText, decode_document};
pub use error::{IngestError, Result};
pub use extract::{DocumentCounts, count_document, extract_schools};
pub use metadata::{MetadataCheck, check_metadata};
pub use parse::{ParseOptions, WRAPPER_TAG, parse_document, parse_document_with, read_document};
