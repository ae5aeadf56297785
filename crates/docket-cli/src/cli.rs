//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use docket_pipeline::ExportFormat;
use std::path::PathBuf;

/// Docket - extract dated legal events from documents into a five-column table.
#[derive(Debug, Parser)]
#[command(name = "docket")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (TOML, never holds credentials)
    #[arg(short, long, global = true, env = "DOCKET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract events from documents
    Extract(ExtractArgs),

    /// List event providers and whether their credentials are set
    Providers,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table on the terminal (default)
    Table,
    /// Comma-separated values
    Csv,
    /// JSON array keyed by column header
    Json,
    /// Excel workbook (requires --output)
    Xlsx,
}

impl CliFormat {
    /// Export format, or `None` for terminal tables
    pub fn export_format(&self) -> Option<ExportFormat> {
        match self {
            CliFormat::Table => None,
            CliFormat::Csv => Some(ExportFormat::Csv),
            CliFormat::Json => Some(ExportFormat::Json),
            CliFormat::Xlsx => Some(ExportFormat::Xlsx),
        }
    }
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Documents to process (pdf, txt, md, html, eml)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Event provider key (overrides EVENT_EXTRACTOR)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: CliFormat,

    /// Write the export to this path instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Measure and show per-document timing columns
    #[arg(long)]
    pub timing: bool,

    /// Show the estimated provider cost column
    #[arg(long)]
    pub cost: bool,
}
