//! CLI argument definitions for the STIX cleaner.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "stix",
    version,
    about = "STIX enrollment upload cleaner",
    long_about = "Normalize and validate STIX school enrollment uploads.\n\n\
                  Removes schools without students, standardizes phone numbers,\n\
                  unit designators and street numbers, and writes an audit log\n\
                  of every change."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow student field values (names, phone numbers) in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Clean an upload and write the corrected XML and audit log.
    Clean(CleanArgs),

    /// Write CSV student exports and print distributions.
    Export(ExportArgs),

    /// Rename an upload to the board's standard file name.
    Rename(RenameArgs),
}

#[derive(Parser)]
pub struct CleanArgs {
    /// Upload XML file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Cleaned XML path (default: <INPUT-STEM>_CLEAN.xml).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Audit log path (default: <INPUT-STEM>.log).
    #[arg(long = "audit-log", value_name = "PATH")]
    pub audit_log: Option<PathBuf>,

    /// Audit log layout.
    #[arg(long = "audit-format", value_enum, default_value = "text")]
    pub audit_format: AuditFormatArg,

    /// Normalization rules file (default: $STIX_RULES, else built-in rules).
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: Option<PathBuf>,

    /// Never prompt; fields needing review are flagged in the audit log.
    #[arg(long = "no-prompt")]
    pub no_prompt: bool,

    /// Retry a failed parse with the content wrapped in a synthetic root.
    #[arg(long = "wrap-fragments")]
    pub wrap_fragments: bool,
}

#[derive(Parser)]
pub struct ExportArgs {
    /// Upload XML file, normally the cleaned one.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Base path; files are written as <BASE>_all_students.csv and so on.
    #[arg(long = "output", short = 'o', value_name = "BASE")]
    pub output: PathBuf,

    /// Birth year kept in the filtered export (repeatable, default 2012 and 2013).
    #[arg(long = "birth-year", value_name = "YEAR")]
    pub birth_years: Vec<i32>,

    /// Grade kept in the filtered export (repeatable, default GR7 and GR8).
    #[arg(long = "grade", value_name = "GRADE")]
    pub grades: Vec<String>,

    /// Normalization rules file (default: $STIX_RULES, else built-in rules).
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: Option<PathBuf>,

    /// Retry a failed parse with the content wrapped in a synthetic root.
    #[arg(long = "wrap-fragments")]
    pub wrap_fragments: bool,
}

#[derive(Parser)]
pub struct RenameArgs {
    /// Upload XML file to rename in place.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// School level used in the new name.
    #[arg(value_enum)]
    pub level: SchoolLevelArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AuditFormatArg {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SchoolLevelArg {
    Elementary,
    Secondary,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
