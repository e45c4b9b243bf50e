//! Storage module for persisting synced papers
//!
//! This module owns the persisted-record store:
//! - SQLite database initialization and schema management
//! - Papers, keywords and authors, with their relation tables
//! - Run tracking (one row per sync run)
//! - The "pending index" hand-off for the embedding consumer

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{lock_storage, Storage, StorageError, StorageResult};

use crate::SyncError;
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SyncError> {
    SqliteStorage::new(path)
}

/// A stored paper, as far as the sync needs to know about it
#[derive(Debug, Clone)]
pub struct PaperRecord {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub paper_month: String,
    pub paper_year: String,
    pub published_in: String,
    pub keywords_raw: String,
    pub abstract_text: String,
    pub downloads: u64,
    pub download_url: String,
    pub paper_url: String,
    pub created_at: String,
    pub updated_at: String,
    pub indexed_at: Option<String>,
}

/// A stored author
#[derive(Debug, Clone)]
pub struct AuthorRecord {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub affiliation: String,
    pub website: String,
}

/// Author fields written on first sight
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAuthor {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub affiliation: String,
    pub website: String,
}

/// A paper that has not been handed to the indexing consumer yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPaper {
    pub paper_id: i64,
    pub external_id: String,
    pub title: String,
    pub abstract_text: String,
}

/// Represents a sync run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub mode: String,
    pub status: RunStatus,
    pub pages_processed: u64,
    pub full_scrapes: u64,
    pub version_updates: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Status of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
