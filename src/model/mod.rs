//! Records flowing through one sync run
//!
//! - `ListingRow` / `AuthorRef`: one row of a listing page
//! - `ScrapeAction`: what the run decided to do with a row
//! - `ParsedPaper`: a validated detail page, ready for persistence
//!
//! None of these are persisted directly; the storage layer has its own
//! record types.

mod action;
mod listing;
mod paper;

pub use action::ScrapeAction;
pub use listing::{AuthorRef, ListingRow, ListingStatus};
pub use paper::{ParsedPaper, PaperValidationError};

/// Width of an archive id, e.g. `007001`
pub const PAPER_ID_LENGTH: usize = 6;

/// Id used when a listing row's detail link carries no recognizable id
pub const SENTINEL_PAPER_ID: &str = "000000";
