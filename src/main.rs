//! lingbuzz-sync main entry point
//!
//! This is the command-line interface for the lingbuzz archive mirror.

use anyhow::Context;
use clap::Parser;
use lingbuzz_sync::config::{load_config_with_hash, Config};
use lingbuzz_sync::output::{load_statistics, print_pending_index, print_run_summary, print_statistics};
use lingbuzz_sync::storage::open_storage;
use lingbuzz_sync::sync::{run_sync, SyncMode};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// lingbuzz-sync: an incremental mirror of the lingbuzz archive
///
/// Walks the archive's listing pages, fetches papers that are new or changed,
/// and stores them with their keywords and authors in a local SQLite database.
#[derive(Parser, Debug)]
#[command(name = "lingbuzz-sync")]
#[command(version)]
#[command(about = "Incremental mirror of the lingbuzz archive", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Walk every listing page instead of stopping at the first page with nothing new
    #[arg(long)]
    full: bool,

    /// Treat the archive as holding N papers instead of reading the count off the front page
    #[arg(long, value_name = "N")]
    limit: Option<u64>,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["full", "limit", "pending_index"])]
    stats: bool,

    /// List up to N papers waiting for indexing and exit
    #[arg(long, value_name = "N", conflicts_with_all = ["full", "limit", "stats"])]
    pending_index: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.stats {
        handle_stats(&config)
    } else if let Some(limit) = cli.pending_index {
        handle_pending_index(&config, limit)
    } else {
        let mode = if cli.full {
            SyncMode::Full
        } else {
            SyncMode::Incremental
        };
        handle_sync(config, config_hash, mode, cli.limit).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lingbuzz_sync=info,warn"),
            1 => EnvFilter::new("lingbuzz_sync=debug,info"),
            2 => EnvFilter::new("lingbuzz_sync=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open database")?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --pending-index mode: lists papers not yet indexed
fn handle_pending_index(config: &Config, limit: usize) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open database")?;
    print_pending_index(&storage, limit)?;

    Ok(())
}

/// Handles the main sync operation
async fn handle_sync(
    config: Config,
    config_hash: String,
    mode: SyncMode,
    limit: Option<u64>,
) -> anyhow::Result<()> {
    tracing::info!(
        "Starting {} sync of {} (max {} concurrent requests)",
        mode.as_str(),
        config.archive.base_url,
        config.fetch.max_concurrent_requests
    );
    if let Some(limit) = limit {
        tracing::info!("Using paper count {} instead of discovering it", limit);
    }

    let stats = run_sync(config, config_hash, mode, limit)
        .await
        .context("Sync failed")?;
    print_run_summary(&stats);

    Ok(())
}
