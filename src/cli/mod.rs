//! CLI interface using clap
//!
//! Provides the command-line interface for threadscan

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Threadscan - incremental thread ingestion and word indexing
#[derive(Parser, Debug)]
#[command(name = "threadscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Path to the database (overrides the configuration file)
    #[arg(long, global = true, env = "THREADSCAN_DB")]
    pub db: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and a default configuration file
    Init(InitArgs),

    /// Run one ingestion pass over a community
    Ingest(IngestArgs),

    /// Show what the store contains
    Status,

    /// Show the effective configuration
    Config,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for ingest command
#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Community to scan (e.g. "stocks")
    pub target: String,

    /// Number of recent posts to fetch (overrides the configuration file)
    #[arg(short, long)]
    pub limit: Option<usize>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
