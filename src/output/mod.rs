//! Output module for run summaries and store reports
//!
//! This module handles:
//! - Accumulating per-run statistics and printing the run summary
//! - Loading and printing store-wide statistics
//! - Listing papers waiting for the indexing consumer

mod run;
pub mod stats;

pub use run::{print_run_summary, RowOutcome, RunStats};
pub use stats::{load_statistics, print_pending_index, print_statistics, StoreStatistics};
