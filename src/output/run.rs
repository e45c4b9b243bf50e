//! Run statistics accumulator
//!
//! One `RunStats` is threaded through a sync run and returned at the end.
//! Row tasks report a `RowOutcome`; the coordinator folds those in after each
//! page so no counter is shared across tasks.

use std::time::Duration;

/// What happened to one listing row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// New paper fetched, parsed and persisted
    FullScrape,

    /// Changed paper re-fetched and its stored version refreshed
    VersionUpdate,

    /// Already stored, nothing to do
    Skipped,

    /// Fetch, parse or persistence of the paper row failed
    Failed,
}

/// Counters for one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub pages_processed: u64,
    pub full_scrapes: u64,
    pub version_updates: u64,
    pub skipped: u64,
    pub failed: u64,
    pub duration: Duration,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::FullScrape => self.full_scrapes += 1,
            RowOutcome::VersionUpdate => self.version_updates += 1,
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Failed => self.failed += 1,
        }
    }

    /// Number of rows that led to a fetch
    pub fn actionable(&self) -> u64 {
        self.full_scrapes + self.version_updates + self.failed
    }
}

/// Prints the end-of-run summary to stdout
pub fn print_run_summary(stats: &RunStats) {
    println!("=== Sync Summary ===\n");
    println!("  Pages processed: {}", stats.pages_processed);
    println!("  Full scrapes:    {}", stats.full_scrapes);
    println!("  Version updates: {}", stats.version_updates);
    println!("  Skipped:         {}", stats.skipped);
    println!("  Failed:          {}", stats.failed);
    println!("  Duration:        {:.1}s", stats.duration.as_secs_f64());
}
