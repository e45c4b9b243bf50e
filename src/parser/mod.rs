//! Page parsers
//!
//! Everything here is pure: HTML text in, records out. Nothing fetches or
//! touches the store.

mod detail;
mod keywords;
mod listing;
mod profile;

pub use detail::{normalize_text, DetailPageParser, NOT_FOUND_TITLE};
pub use keywords::split_keywords;
pub use listing::{extract_listing_rows, extract_paper_count, extract_row};
pub use profile::{parse_author_profile, AuthorProfile};
