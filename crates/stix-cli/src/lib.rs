//! CLI library components for the STIX upload cleaner.

pub mod logging;
pub mod pipeline;
pub mod prompt;
