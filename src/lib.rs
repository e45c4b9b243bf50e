//! lingbuzz-sync: an incremental mirror of the lingbuzz archive
//!
//! This crate walks the archive's paginated listing, classifies every entry
//! against the local store, fetches and parses the detail pages that are new
//! or changed, and persists normalized papers with deduplicated keyword and
//! author relations.

pub mod config;
pub mod html;
pub mod model;
pub mod output;
pub mod parser;
pub mod storage;
pub mod sync;
pub mod url;

use thiserror::Error;

/// Main error type for lingbuzz-sync operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch of {url} failed after {attempts} attempts: {message}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("Could not determine archive size: {0}")]
    Discovery(String),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for lingbuzz-sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{AuthorRef, ListingRow, ParsedPaper, ScrapeAction};
pub use output::RunStats;
pub use sync::{Coordinator, SyncMode};
