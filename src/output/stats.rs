//! Statistics generation from the sync database
//!
//! This module provides functionality for extracting and displaying
//! store-wide statistics from the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::SyncError;

/// Store-wide statistics
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    pub papers: u64,
    pub authors: u64,
    pub keywords: u64,
    pub author_relations: u64,
    pub keyword_relations: u64,

    /// Papers not yet handed to the indexing consumer
    pub pending_index: u64,

    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> Result<StoreStatistics, SyncError> {
    Ok(StoreStatistics {
        papers: storage.count_papers()?,
        authors: storage.count_authors()?,
        keywords: storage.count_keywords()?,
        author_relations: storage.count_author_relations()?,
        keyword_relations: storage.count_keyword_relations()?,
        pending_index: storage.count_pending_index()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Store Statistics ===\n");

    println!("Records:");
    println!("  Papers: {}", stats.papers);
    println!("  Authors: {}", stats.authors);
    println!("  Keywords: {}", stats.keywords);
    println!();

    println!("Relations:");
    println!("  Author-paper: {}", stats.author_relations);
    println!("  Keyword-paper: {}", stats.keyword_relations);
    println!();

    let indexed = stats.papers.saturating_sub(stats.pending_index);
    let indexed_rate = if stats.papers > 0 {
        (indexed as f64 / stats.papers as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Indexing: {} pending, {:.1}% indexed",
        stats.pending_index, indexed_rate
    );
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run (#{}):", run.id);
            println!("  Mode: {}", run.mode);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!(
                "  Pages: {}, full scrapes: {}, version updates: {}, skipped: {}, failed: {}",
                run.pages_processed,
                run.full_scrapes,
                run.version_updates,
                run.skipped,
                run.failed
            );
        }
        None => println!("No runs recorded yet"),
    }
}

/// Prints up to `limit` papers waiting for indexing, oldest first
pub fn print_pending_index(storage: &dyn Storage, limit: usize) -> Result<(), SyncError> {
    let papers = storage.papers_pending_index(limit)?;
    if papers.is_empty() {
        println!("No papers pending indexing");
        return Ok(());
    }

    for paper in papers {
        println!("{}\t{}\t{}", paper.paper_id, paper.external_id, paper.title);
    }
    Ok(())
}
