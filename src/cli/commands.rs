//! Command implementations

use super::OutputFormat;
use crate::config::Config;
use crate::ingest::{IngestConfig, Ingestor, PassReport};
use crate::remote::RedditClient;
use crate::storage::{Database, StoreStats};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load the configuration file and apply command-line overrides
pub fn load_config(path: &Path, db_override: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load_or_default(path)?;
    if let Some(db) = db_override {
        config.database_path = db;
    }
    Ok(config)
}

/// Create the database and write the configuration file
pub fn init(config_path: &Path, config: &Config, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration already exists at {:?}. Use --force to overwrite it.",
            config_path
        );
    }

    let _db = Database::open(&config.database_path)?;
    config.save(config_path)?;

    println!("✓ Initialized threadscan");
    println!("  Database: {:?}", config.database_path);
    println!("  Config: {:?}", config_path);

    Ok(())
}

/// Run one ingestion pass over `target`
pub fn ingest(config: &Config, target: &str, limit: Option<usize>) -> Result<PassReport> {
    let mut db = Database::open(&config.database_path)?;
    let client = RedditClient::new(&config.remote).context("Failed to create HTTP client")?;

    let mut pass_config = IngestConfig::from_config(target, config);
    if let Some(limit) = limit {
        pass_config.post_limit = limit;
    }

    let report = Ingestor::new(pass_config, &mut db, &client)
        .run_pass()
        .with_context(|| format!("Ingestion pass over '{}' failed", target))?;

    Ok(report)
}

/// Read store statistics; `None` if no database has been created yet
pub fn status(config: &Config) -> Result<Option<StoreStats>> {
    if !config.database_path.exists() {
        return Ok(None);
    }

    let db = Database::open(&config.database_path)?;
    db.stats().map(Some)
}

/// Print a pass report in JSON format
pub fn print_report_json(report: &PassReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Print a pass report in text format
pub fn print_report_text(target: &str, report: &PassReport) {
    println!("✓ Pass over {} committed", target);
    println!("  Posts seen: {}", report.posts_seen);
    println!("  Posts skipped (unchanged): {}", report.posts_skipped);
    println!("  Posts revisited: {}", report.posts_revisited);
    println!("  New posts: {}", report.links_inserted);
    println!("  New comments: {}", report.comments_inserted);
    println!("  Words indexed: {}", report.words_inserted);
}

/// Print store statistics in JSON format
pub fn print_stats_json(stats: &StoreStats) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

/// Print store statistics in text format
pub fn print_stats_text(stats: &StoreStats) {
    println!("Threadscan Status");
    println!("=================\n");

    println!("Objects: {}", stats.objects);
    for (kind, count) in &stats.objects_by_kind {
        println!("  {}: {}", kind, count);
    }
    println!("Word occurrences: {}", stats.words);
    println!("Distinct words: {}", stats.distinct_words);
    println!("Passes: {}", stats.passes);

    match stats.last_pass {
        Some(ref pass) => {
            println!("\nLast pass:");
            println!("  Target: {}", pass.target);
            println!("  Finished: {}", pass.finished_at);
            println!(
                "  Posts: {} ({} skipped)",
                pass.posts_seen, pass.posts_skipped
            );
            println!("  New objects: {}", pass.objects_inserted);
            println!("  Words indexed: {}", pass.words_inserted);
        }
        None => println!("\nNo passes recorded yet."),
    }
}

/// Report that there is no database to read
pub fn print_missing_database(path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::Value::Null),
        OutputFormat::Text => {
            println!("No database at {:?} yet.", path);
            println!("Run `threadscan init` or `threadscan ingest <target>` to create it.");
        }
    }
    Ok(())
}

/// Print the effective configuration as TOML
pub fn print_config(config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    print!("{}", content);
    Ok(())
}
