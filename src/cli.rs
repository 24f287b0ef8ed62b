use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Schema-driven CSV encoding and decoding", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Estimate the number of rows across CSV files by sampling their first lines
    Estimate(EstimateArgs),
    /// Decode CSV against a schema, optionally project columns, and encode it again
    Transcode(TranscodeArgs),
}

#[derive(Debug, Args)]
pub struct EstimateArgs {
    /// CSV files to estimate
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct TranscodeArgs {
    /// YAML table definition (fields and default format options)
    #[arg(short, long)]
    pub schema: PathBuf,
    /// Input CSV file (`-` for stdin)
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,
    /// Output CSV file (stdout when omitted or `-`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Read-side format override such as `fieldDelimiter=\t` (repeatable)
    #[arg(long = "option", value_name = "KEY=VALUE", action = clap::ArgAction::Append)]
    pub options: Vec<String>,
    /// Write-side format override (repeatable)
    #[arg(long = "output-option", value_name = "KEY=VALUE", action = clap::ArgAction::Append)]
    pub output_options: Vec<String>,
    /// Columns to keep, in output order; `parent.child` selects a nested field
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Skip rows that fail to parse instead of aborting
    #[arg(long)]
    pub ignore_parse_errors: bool,
}
