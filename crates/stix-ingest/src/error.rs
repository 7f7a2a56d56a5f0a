//! Error types for upload ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading an upload.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Upload file not found.
    #[error("upload file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Malformed Document Errors ===
    /// The XML is not well-formed.
    #[error("malformed XML at line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// End of input reached with elements still open.
    #[error("unexpected end of document: <{name}> opened at line {line} is never closed")]
    UnclosedElement { name: String, line: usize },

    /// A second top-level element was found.
    #[error("second root element <{name}> at line {line}")]
    MultipleRoots { name: String, line: usize },

    /// The input holds no element at all.
    #[error("document has no root element")]
    EmptyDocument,
}

impl IngestError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }

    /// Whether wrapping the input in a synthetic root may recover it.
    pub fn is_fragment_error(&self) -> bool {
        matches!(self, Self::MultipleRoots { .. } | Self::Malformed { .. })
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
