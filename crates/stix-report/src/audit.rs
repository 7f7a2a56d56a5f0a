//! Audit log file output.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use stix_core::AuditLog;
use tracing::info;

/// On-disk layout of the audit log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuditFormat {
    /// One `position | kind | 'original' -> 'value' | DECISION | reason` line per entry.
    #[default]
    Text,
    /// Array of tagged entries.
    Json,
}

pub fn render_audit_log(audit: &AuditLog, format: AuditFormat) -> Result<String> {
    match format {
        AuditFormat::Text => {
            let mut out = String::new();
            for line in audit.lines() {
                out.push_str(&line);
                out.push('\n');
            }
            Ok(out)
        }
        AuditFormat::Json => {
            let mut out = serde_json::to_string_pretty(audit.entries())
                .context("serialize audit entries")?;
            out.push('\n');
            Ok(out)
        }
    }
}

pub fn write_audit_log(audit: &AuditLog, path: &Path, format: AuditFormat) -> Result<()> {
    let rendered = render_audit_log(audit, format)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, rendered).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), entries = audit.len(), "wrote audit log");
    Ok(())
}
