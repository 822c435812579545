//! Defines the command-line arguments and subcommands for the review-stats CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::pipeline::RunConfig;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "review-stats",
    version,
    about = "Descriptive statistics and LaTeX tables from literature review annotations."
)]
pub struct ReviewArgs {
    /// Log at debug level (overrides REVIEW_STATS_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// When to color terminal output.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

/// Annotation table and field schema, shared by most subcommands.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// CSV export of the annotation table.
    #[arg(long, default_value = "data/annotations.csv")]
    pub table: PathBuf,
    /// Field schema YAML.
    #[arg(long, default_value = "config/fields.yaml")]
    pub schema: PathBuf,
}

/// Inputs plus report definitions and the output directory.
#[derive(Debug, Clone, Args)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
    /// Directory searched recursively for report YAML files.
    #[arg(long, default_value = "config/reports")]
    pub reports: PathBuf,
    /// Output directory for artifacts.
    #[arg(long, default_value = "output")]
    pub out: PathBuf,
}

impl PipelineArgs {
    pub fn to_config(&self) -> RunConfig {
        RunConfig {
            table: self.inputs.table.clone(),
            schema: self.inputs.schema.clone(),
            reports: self.reports.clone(),
            out: self.out.clone(),
        }
    }
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Full pipeline: load, aggregate, write artifacts and print the audit.
    Run {
        #[command(flatten)]
        args: PipelineArgs,
    },
    /// Print the audit of unparsed labels, vocabulary misses and numeric failures.
    Audit {
        #[command(flatten)]
        inputs: InputArgs,
        /// List every issue, not just the per-field counts.
        #[arg(long)]
        details: bool,
        /// Print the audit as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Parse and normalize a single cell.
    Parse {
        /// The raw cell text.
        cell: String,
        /// Field schema YAML; only read when --field is given.
        #[arg(long, default_value = "config/fields.yaml")]
        schema: PathBuf,
        /// Field whose vocabulary and parser settings apply.
        #[arg(long)]
        field: Option<String>,
        /// Print tags and entries as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Regenerate in memory and diff against the artifacts on disk.
    Check {
        #[command(flatten)]
        args: PipelineArgs,
    },
}
