//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, ingest::IngestArgs,
    query::QueryCommands, stats::StatsArgs,
};

#[derive(Parser)]
#[command(name = "plp")]
#[command(author, version, about = "PCBA Log Parser")]
#[command(long_about = "Ingest manufacturing test-station logs into a queryable SQLite store.\n\nJSON payloads embedded in the logs are extracted, typed, correlated per unit and written as download, station and step records.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Additional config file (overrides the global config)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQLite store file (overrides config and PLP_DATABASE)
    #[arg(long, short = 'd', global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest log files or directories into the store
    Ingest(IngestArgs),

    /// Read-only lookups over the store
    #[command(subcommand)]
    Query(QueryCommands),

    /// Show store statistics
    Stats(StatsArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for single records, tsv for lists)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    #[value(alias = "table")]
    Md,
    /// Just IDs, one per line
    Id,
}
