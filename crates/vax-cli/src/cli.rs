//! CLI argument definitions for the survey reconciler.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "vax-reconcile",
    version,
    about = "Reconcile school immunization survey extracts into one table",
    long_about = "Reconcile yearly school immunization survey extracts.\n\n\
                  Each source is cleaned with the column mapping declared in a JSON\n\
                  manifest, the results are unioned, and per-year coverage is reported."
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Normalize, concatenate and aggregate every source in a manifest.
    Run(RunArgs),

    /// Print the first raw rows of a CSV with row and column indices.
    Preview(PreviewArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to the JSON manifest listing sources and their mappings.
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Write the normalized table as CSV.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write the per-year summary as CSV.
    #[arg(long = "summary", value_name = "PATH")]
    pub summary: Option<PathBuf>,

    /// Write the rejection log as JSON.
    #[arg(long = "rejections", value_name = "PATH")]
    pub rejections: Option<PathBuf>,

    /// Exit with a non-zero status if any row was rejected.
    #[arg(long = "strict")]
    pub strict: bool,
}

#[derive(Parser)]
pub struct PreviewArgs {
    /// CSV file to inspect.
    #[arg(value_name = "CSV")]
    pub path: PathBuf,

    /// Number of rows to print.
    #[arg(long = "rows", short = 'n', default_value_t = 10)]
    pub rows: usize,
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
