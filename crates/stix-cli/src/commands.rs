use std::path::PathBuf;

use anyhow::Result;
use stix_cli::pipeline::{self, CleanConfig, CleanResult};
use stix_cli::prompt::TerminalResolver;
use stix_core::DeferResolver;
use stix_ingest::ParseOptions;
use stix_report::{AuditFormat, ExportOptions, ExportSummary, SchoolLevel};

use crate::cli::{AuditFormatArg, CleanArgs, ExportArgs, RenameArgs, SchoolLevelArg};

pub fn run_clean(args: &CleanArgs) -> Result<CleanResult> {
    let config = CleanConfig {
        input: args.input.clone(),
        output: args.output.clone(),
        audit_log: args.audit_log.clone(),
        audit_format: match args.audit_format {
            AuditFormatArg::Text => AuditFormat::Text,
            AuditFormatArg::Json => AuditFormat::Json,
        },
        rules: args.rules.clone(),
        parse: ParseOptions {
            wrap_fragments: args.wrap_fragments,
        },
    };
    if args.no_prompt {
        pipeline::run_clean(&config, &mut DeferResolver)
    } else {
        pipeline::run_clean(&config, &mut TerminalResolver::stdio())
    }
}

pub fn run_export(args: &ExportArgs) -> Result<ExportSummary> {
    let defaults = ExportOptions::default();
    let options = ExportOptions {
        birth_years: if args.birth_years.is_empty() {
            defaults.birth_years
        } else {
            args.birth_years.clone()
        },
        grades: if args.grades.is_empty() {
            defaults.grades
        } else {
            args.grades.clone()
        },
    };
    pipeline::run_export(
        &args.input,
        &args.output,
        &options,
        args.rules.as_deref(),
        &ParseOptions {
            wrap_fragments: args.wrap_fragments,
        },
    )
}

pub fn run_rename(args: &RenameArgs) -> Result<PathBuf> {
    let level = match args.level {
        SchoolLevelArg::Elementary => SchoolLevel::Elementary,
        SchoolLevelArg::Secondary => SchoolLevel::Secondary,
    };
    pipeline::rename_upload(&args.input, level, None, &ParseOptions::default())
}
