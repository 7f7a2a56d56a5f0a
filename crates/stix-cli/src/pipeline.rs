//! File-level runners behind the `clean`, `export` and `rename` commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use stix_core::{AuditLog, CleanReport, Resolver, clean_document};
use stix_ingest::{
    DocumentCounts, ParseOptions, check_metadata, count_document, extract_schools, read_document,
};
use stix_report::{
    AuditFormat, ExportOptions, ExportSummary, SchoolLevel, export_students, standard_file_name,
    write_audit_log, write_document_file,
};
use stix_standards::{FieldCatalog, NormalizationRules, resolve_rules};
use tracing::{info, info_span};

#[derive(Debug, Clone, Default)]
pub struct CleanConfig {
    pub input: PathBuf,
    /// Defaults to `<input-stem>_CLEAN.xml` next to the input.
    pub output: Option<PathBuf>,
    /// Defaults to `<input-stem>.log` next to the input.
    pub audit_log: Option<PathBuf>,
    pub audit_format: AuditFormat,
    pub rules: Option<PathBuf>,
    pub parse: ParseOptions,
}

#[derive(Debug)]
pub struct CleanResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub audit_log: PathBuf,
    pub report: CleanReport,
    pub audit: AuditLog,
}

pub fn default_output_path(input: &Path) -> PathBuf {
    sibling_with_suffix(input, "_CLEAN.xml")
}

pub fn default_audit_path(input: &Path) -> PathBuf {
    sibling_with_suffix(input, ".log")
}

fn sibling_with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    input.with_file_name(format!("{stem}{suffix}"))
}

/// Read, clean and write one upload, then check the written file.
///
/// Nothing is written when reading or parsing fails.
pub fn run_clean<R>(config: &CleanConfig, resolver: &mut R) -> Result<CleanResult>
where
    R: Resolver + ?Sized,
{
    let _span = info_span!("run", input = %config.input.display()).entered();
    let rules = resolve_rules(config.rules.as_deref()).context("load normalization rules")?;
    let mut document = read_document(&config.input, &config.parse)
        .with_context(|| format!("read {}", config.input.display()))?;

    let mut audit = AuditLog::new();
    let report = clean_document(&mut document, &rules, resolver, &mut audit);

    let output = config
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&config.input));
    let audit_log = config
        .audit_log
        .clone()
        .unwrap_or_else(|| default_audit_path(&config.input));
    write_document_file(&document, &output)?;
    write_audit_log(&audit, &audit_log, config.audit_format)?;
    verify_output(&output, &rules, report.counts)?;

    Ok(CleanResult {
        input: config.input.clone(),
        output,
        audit_log,
        report,
        audit,
    })
}

/// Re-parse a written document and compare its school and student totals.
pub fn verify_output(
    path: &Path,
    rules: &NormalizationRules,
    expected: DocumentCounts,
) -> Result<()> {
    let document = read_document(path, &ParseOptions::default())
        .with_context(|| format!("re-read {}", path.display()))?;
    let actual = count_document(&document, &FieldCatalog::from_rules(rules));
    if actual != expected {
        bail!(
            "output verification failed for {}: expected {} schools / {} students, found {} / {}",
            path.display(),
            expected.schools,
            expected.students,
            actual.schools,
            actual.students
        );
    }
    info!(
        schools = actual.schools,
        students = actual.students,
        "output verified"
    );
    Ok(())
}

/// Write the CSV exports for an upload (normally an already-cleaned one).
pub fn run_export(
    input: &Path,
    base: &Path,
    options: &ExportOptions,
    rules: Option<&Path>,
    parse: &ParseOptions,
) -> Result<ExportSummary> {
    let rules = resolve_rules(rules).context("load normalization rules")?;
    let document =
        read_document(input, parse).with_context(|| format!("read {}", input.display()))?;
    let schools = extract_schools(&document, &FieldCatalog::from_rules(&rules));
    export_students(&schools, base, options)
}

/// Rename `input` to the board's standard name in the same directory.
pub fn rename_upload(
    input: &Path,
    level: SchoolLevel,
    rules: Option<&Path>,
    parse: &ParseOptions,
) -> Result<PathBuf> {
    let rules = resolve_rules(rules).context("load normalization rules")?;
    let document =
        read_document(input, parse).with_context(|| format!("read {}", input.display()))?;
    let check = check_metadata(&document, &FieldCatalog::from_rules(&rules), &rules);
    let name = standard_file_name(&check.metadata, level)?;
    let target = input.with_file_name(&name);
    if target.exists() {
        bail!("{} already exists", target.display());
    }
    std::fs::rename(input, &target)
        .with_context(|| format!("rename {} to {}", input.display(), target.display()))?;
    info!(from = %input.display(), to = %target.display(), "renamed upload");
    Ok(target)
}
