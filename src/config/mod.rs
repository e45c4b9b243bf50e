//! Configuration module for lingbuzz-sync
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use lingbuzz_sync::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("lingbuzz.toml")).unwrap();
//! println!("Mirroring {}", config.archive.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ArchiveConfig, Config, FetchConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
