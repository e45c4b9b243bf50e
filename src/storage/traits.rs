//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::ParsedPaper;
use crate::output::RunStats;
use crate::storage::{AuthorRecord, NewAuthor, PaperRecord, PendingPaper, RunRecord, RunStatus};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Locks shared storage, turning a poisoned lock into an error
///
/// Guards must not be held across an `.await`.
pub fn lock_storage<S>(storage: &Mutex<S>) -> StorageResult<MutexGuard<'_, S>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Trait for storage backend implementations
///
/// Every method is a single statement (or a single read), so callers may
/// interleave calls from many in-flight rows. A paper and its relations are
/// not written atomically as a unit.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new sync run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `mode` - `incremental` or `full`
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, mode: &str) -> StorageResult<i64>;

    /// Records the final status and counters of a run
    fn finish_run(&mut self, run_id: i64, status: RunStatus, stats: &RunStats)
        -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Papers =====

    /// Looks a paper up by its archive id
    fn find_paper_by_external_id(&self, external_id: &str) -> StorageResult<Option<PaperRecord>>;

    /// Inserts a new paper row
    ///
    /// Fails with `ConstraintViolation` if the archive id is already stored.
    ///
    /// # Returns
    ///
    /// The generated paper ID
    fn insert_paper(&mut self, paper: &ParsedPaper) -> StorageResult<i64>;

    /// Overwrites the version-specific columns of a stored paper
    ///
    /// Relations are left untouched.
    fn update_paper_version(&mut self, paper_id: i64, paper: &ParsedPaper) -> StorageResult<()>;

    // ===== Keywords =====

    /// Inserts a keyword, doing nothing if the text is already stored
    fn upsert_keyword(&mut self, keyword: &str) -> StorageResult<()>;

    fn find_keyword_id(&self, keyword: &str) -> StorageResult<Option<i64>>;

    fn insert_keyword_paper(&mut self, keyword_id: i64, paper_id: i64) -> StorageResult<()>;

    /// Keywords related to a paper, alphabetically
    fn keywords_for_paper(&self, paper_id: i64) -> StorageResult<Vec<String>>;

    // ===== Authors =====

    fn find_author_by_username(&self, username: &str) -> StorageResult<Option<AuthorRecord>>;

    /// Inserts an author and returns its ID
    ///
    /// If another task stored the same username first, the existing ID is
    /// returned and the given fields are ignored.
    fn insert_author(&mut self, author: &NewAuthor) -> StorageResult<i64>;

    /// Relates an author to a paper at a 1-based byline position
    fn insert_author_paper(
        &mut self,
        author_id: i64,
        paper_id: i64,
        position: u32,
    ) -> StorageResult<()>;

    /// `(position, username)` pairs for a paper, in byline order
    fn authors_for_paper(&self, paper_id: i64) -> StorageResult<Vec<(u32, String)>>;

    // ===== Indexing =====

    /// Papers not yet handed to the indexing consumer, oldest first
    fn papers_pending_index(&self, limit: usize) -> StorageResult<Vec<PendingPaper>>;

    /// Marks papers as indexed
    ///
    /// # Returns
    ///
    /// Number of rows touched
    fn mark_indexed(&mut self, paper_ids: &[i64]) -> StorageResult<u64>;

    // ===== Statistics =====

    fn count_papers(&self) -> StorageResult<u64>;

    fn count_authors(&self) -> StorageResult<u64>;

    fn count_keywords(&self) -> StorageResult<u64>;

    fn count_author_relations(&self) -> StorageResult<u64>;

    fn count_keyword_relations(&self) -> StorageResult<u64>;

    fn count_pending_index(&self) -> StorageResult<u64>;
}
