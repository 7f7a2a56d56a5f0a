//! Rules file resolution.

use std::path::{Path, PathBuf};

use crate::error::RulesError;
use crate::rules::NormalizationRules;

/// Environment variable naming a rules file.
pub const RULES_ENV_VAR: &str = "STIX_RULES";

/// Load the normalization rules for a run.
///
/// Resolution order:
/// 1. `explicit` (the `--rules` flag)
/// 2. `STIX_RULES` environment variable
/// 3. built-in defaults
pub fn resolve_rules(explicit: Option<&Path>) -> Result<NormalizationRules, RulesError> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(RULES_ENV_VAR).map(PathBuf::from));
    match path {
        Some(path) => NormalizationRules::load(&path),
        None => {
            tracing::debug!("using built-in normalization rules");
            Ok(NormalizationRules::default())
        }
    }
}
