//! Sync module for incremental archive mirroring
//!
//! This module contains the core pipeline, including:
//! - HTTP fetching with bounded exponential-backoff retry
//! - Sliding-window concurrency for detail page work
//! - Listing page URL generation and archive size discovery
//! - Row classification against the store
//! - Paper persistence with isolated relation failures
//! - Overall run coordination

mod classify;
mod coordinator;
mod fetcher;
mod limiter;
mod paginator;
mod persist;

pub use classify::{classify, classify_rows, PaperLookup, ALREADY_PRESENT};
pub use coordinator::{Coordinator, SyncMode};
pub use fetcher::{build_http_client, with_retry, FetchFailure, Fetcher, RetryPolicy};
pub use limiter::map_with_concurrency;
pub use paginator::{ListingPaginator, FIRST_START, PAGE_SIZE, SECOND_START};
pub use persist::PersistenceEngine;

use crate::config::Config;
use crate::output::RunStats;
use crate::SyncError;

/// Runs a complete sync against the configured database
///
/// This is the main entry point for a sync. It will:
/// 1. Open the storage layer and record a new run
/// 2. Generate listing page URLs, discovering the archive size unless `total` is given
/// 3. Classify each page's rows and process them with bounded concurrency
/// 4. Stop early in incremental mode once a page has nothing new
/// 5. Record and return the run statistics
pub async fn run_sync(
    config: Config,
    config_hash: String,
    mode: SyncMode,
    total: Option<u64>,
) -> Result<RunStats, SyncError> {
    let coordinator = Coordinator::new(config, config_hash, mode)?;
    coordinator.run(total).await
}
