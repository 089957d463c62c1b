//! Threadscan - incremental thread ingestion
//!
//! Scans a community's recent posts and indexes every unseen post and
//! comment into a local SQLite database.

use anyhow::Result;
use threadscan::cli::{
    init, ingest, load_config, print_config, print_missing_database, print_report_json,
    print_report_text, print_stats_json, print_stats_text, status, Cli, Commands, OutputFormat,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Setup logging; RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = load_config(&cli.config, cli.db.clone())?;

    // Execute command
    match cli.command {
        Commands::Init(args) => {
            init(&cli.config, &config, args.force)?;
        }

        Commands::Ingest(args) => {
            let report = ingest(&config, &args.target, args.limit)?;

            match cli.format {
                OutputFormat::Json => print_report_json(&report)?,
                OutputFormat::Text => print_report_text(&args.target, &report),
            }
        }

        Commands::Status => match status(&config)? {
            Some(stats) => match cli.format {
                OutputFormat::Json => print_stats_json(&stats)?,
                OutputFormat::Text => print_stats_text(&stats),
            },
            None => print_missing_database(&config.database_path, cli.format)?,
        },

        Commands::Config => {
            print_config(&config)?;
        }
    }

    Ok(())
}
