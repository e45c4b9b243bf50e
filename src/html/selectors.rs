//! Every CSS selector the parsers use
//!
//! The archive's markup is old table layout with no classes or ids to hook
//! into, so selectors are positional. When the layout drifts, this is the
//! file to change.

use scraper::Selector;
use std::sync::LazyLock;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Page `<title>`
pub static PAGE_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));

/// Element holding the total paper count on the front page
pub static PAPER_COUNT: LazyLock<Selector> = LazyLock::new(|| selector("center > b > a"));

/// All tables, in document order
pub static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table"));

/// The listing table nested inside the third page table
pub static LISTING_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("td > table"));

/// Position of the table that wraps the listing, counted over all tables
pub const LISTING_WRAPPER_INDEX: usize = 2;

pub static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));

pub static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));

pub static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a"));

pub static LINK_WITH_HREF: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

/// Header block on a detail page (title, authors, date)
pub static DETAIL_HEADER: LazyLock<Selector> = LazyLock::new(|| selector("body > center"));

/// Metadata table on a detail page
pub static DETAIL_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("body > table"));

/// Profile page value cells, by row: email, affiliation, website
pub static PROFILE_EMAIL: LazyLock<Selector> =
    LazyLock::new(|| selector("body > table > tbody > tr:nth-child(2) > td.value"));

pub static PROFILE_AFFILIATION: LazyLock<Selector> =
    LazyLock::new(|| selector("body > table > tbody > tr:nth-child(3) > td.value"));

pub static PROFILE_WEBSITE: LazyLock<Selector> =
    LazyLock::new(|| selector("body > table > tbody > tr:nth-child(4) > td.value"));
