//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cda2fhir",
    version,
    about = "CDA to FHIR transformer - convert Cancer Data Commons extracts into FHIR resources",
    long_about = "Transform raw Cancer Data Commons (CDA) extracts into FHIR resource graphs.\n\n\
                  Emits one newline-delimited file per resource kind and validates the\n\
                  resulting graph for referential integrity."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Transform a raw CDA extract into FHIR ndjson files.
    Transform(TransformArgs),

    /// Validate an emitted directory for referential integrity.
    Validate(ValidateArgs),

    /// List all emitted resource kinds.
    Kinds,
}

#[derive(Parser)]
pub struct TransformArgs {
    /// Path to the raw extract folder (subject.json, association_tables/, ...).
    #[arg(value_name = "RAW_DIR")]
    pub raw_dir: PathBuf,

    /// Output directory for ndjson files (default: <RAW_DIR>/META).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Number of subjects to randomly sample - max 100.
    #[arg(long = "n-subjects", value_name = "N")]
    pub n_subjects: Option<usize>,

    /// Cap on diagnosis records mapped per subject.
    #[arg(long = "n-diagnosis", value_name = "N")]
    pub n_diagnosis: Option<usize>,

    /// Cap on file records mapped per subject.
    #[arg(long = "n-files", value_name = "N")]
    pub n_files: Option<usize>,

    /// Seed for reproducible subject sampling.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Run the file/document sub-mapping (DocumentReference, Group).
    #[arg(long = "include-files")]
    pub include_files: bool,

    /// Run the mutation sub-mapping (genomic observations).
    #[arg(long = "include-mutation")]
    pub include_mutation: bool,

    /// Skip the treatment sub-mapping (medication fan-out).
    #[arg(long = "no-treatment")]
    pub no_treatment: bool,

    /// Skip the diagnosis sub-mapping (conditions and stage observations).
    #[arg(long = "no-condition")]
    pub no_condition: bool,

    /// Append new resources to existing ndjson files instead of replacing.
    #[arg(long)]
    pub extend: bool,

    /// Transform and validate without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Write the validation report JSON to this path.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Path to an emitted directory of <Kind>.ndjson files.
    #[arg(value_name = "META_DIR")]
    pub meta_dir: PathBuf,

    /// Write the validation report JSON to this path.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum LogFormatArg {
    #[default]
    Pretty,
    Compact,
    Json,
}
