//! Listing and front page parsing
//!
//! A listing page is a table of four-cell rows:
//! authors | status | pdf link | title link.
//! Rows with fewer cells are layout rows and are ignored.

use crate::html::{all_within, attr, find_within, selectors, text_of, Page};
use crate::model::{AuthorRef, ListingRow, ListingStatus, SENTINEL_PAPER_ID};
use crate::url::{detail_url, extract_paper_id, extract_username, resolve_download_url, resolve_link};
use crate::SyncError;
use regex::Regex;
use scraper::ElementRef;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use url::Url;

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("integer regex is valid"));

/// Parses one listing row into a `ListingRow`
///
/// Returns `None` for rows with fewer than four cells. A title link without
/// a recognizable id yields the all-zero id and a warning.
pub fn extract_row(row: ElementRef<'_>, base_url: &Url) -> Option<ListingRow> {
    let cells = all_within(row, &selectors::CELL);
    if cells.len() < 4 {
        return None;
    }

    let (author_cell, status_cell, file_cell, title_cell) = (cells[0], cells[1], cells[2], cells[3]);

    let status = ListingStatus::parse(&text_of(status_cell));

    let mut authors = BTreeMap::new();
    for (index, link) in all_within(author_cell, &selectors::LINK).into_iter().enumerate() {
        authors.insert(index as u32 + 1, extract_author(link, base_url));
    }

    let download_url = find_within(file_cell, &selectors::LINK)
        .and_then(|a| attr(a, "href"))
        .and_then(|href| resolve_download_url(base_url, href))
        .unwrap_or_default();

    let title_link = find_within(title_cell, &selectors::LINK);
    let title = title_link.map(text_of).unwrap_or_default();
    let href = title_link.and_then(|a| attr(a, "href")).unwrap_or_default();

    let id = match extract_paper_id(href) {
        Some(id) => id,
        None => {
            tracing::warn!(
                href,
                title = %title,
                "Listing row has no paper id in its title link, using {}",
                SENTINEL_PAPER_ID
            );
            SENTINEL_PAPER_ID.to_string()
        }
    };

    Some(ListingRow {
        detail_url: detail_url(base_url, &id),
        id,
        title,
        status,
        authors,
        download_url,
    })
}

/// Author link text is `"Last, First"`
fn extract_author(link: ElementRef<'_>, base_url: &Url) -> AuthorRef {
    let name = text_of(link);
    let mut parts = name.split(", ");
    let last_name = parts.next().unwrap_or_default().to_string();
    let first_name = parts.next().unwrap_or_default().to_string();

    let href = attr(link, "href").unwrap_or_default();
    let profile_url = if href.is_empty() {
        String::new()
    } else {
        resolve_link(base_url, href)
    };

    AuthorRef {
        first_name,
        last_name,
        profile_url,
        username: extract_username(href),
    }
}

/// Parses every data row of a listing page
///
/// A page without the listing table yields no rows.
pub fn extract_listing_rows(html: &str, base_url: &Url) -> Vec<ListingRow> {
    let page = Page::parse(html);
    let tables = page.all_matching(&selectors::TABLE);

    let listing = tables
        .get(selectors::LISTING_WRAPPER_INDEX)
        .and_then(|wrapper| find_within(*wrapper, &selectors::LISTING_TABLE));

    let Some(listing) = listing else {
        tracing::warn!("Listing table not found on page");
        return Vec::new();
    };

    all_within(listing, &selectors::ROW)
        .into_iter()
        .filter_map(|row| extract_row(row, base_url))
        .collect()
}

/// Reads the archive's total paper count off the front page
///
/// The count is the last integer in the count element's text.
pub fn extract_paper_count(html: &str) -> Result<u64, SyncError> {
    let page = Page::parse(html);
    let element = page
        .find_first(&selectors::PAPER_COUNT)
        .ok_or_else(|| SyncError::Discovery("Paper count element not found".to_string()))?;

    let text = text_of(element);
    let count = INTEGER
        .find_iter(&text)
        .last()
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .filter(|count| *count > 0);

    count.ok_or_else(|| SyncError::Discovery(format!("Paper count not found in '{}'", text)))
}
