//! `resolve` and `eval` commands

mod handler;

use std::path::PathBuf;

use clap::{Args, ValueEnum};

pub use handler::{handle_eval_command, handle_resolve_command};

/// Output format for resolved rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table with a header
    Table,
    /// Comma-separated values with a header row
    Csv,
}

#[derive(Debug, Args)]
pub struct ResolveCommands {
    /// Grid definition (TOML)
    #[arg(short, long)]
    pub grid: PathBuf,

    /// Records to resolve (JSON object or array of objects)
    #[arg(short, long)]
    pub records: PathBuf,

    /// Message catalog (TOML); without one, message keys are shown as-is
    #[arg(short, long)]
    pub messages: Option<PathBuf>,

    /// Locale used for translated labels
    #[arg(short, long, default_value = "en")]
    pub locale: String,

    /// Only resolve these columns (repeatable)
    #[arg(short, long = "column")]
    pub columns: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Args)]
pub struct EvalCommands {
    /// Expression to evaluate
    pub expression: String,

    /// Record to evaluate against (JSON object); without one no variables are defined
    #[arg(short, long)]
    pub record: Option<PathBuf>,

    /// Logical name of the record, used to find its `<name>id` identity
    #[arg(short, long, default_value = "record")]
    pub entity: String,
}
