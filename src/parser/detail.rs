//! Detail page parsing
//!
//! A detail page has three parts:
//! - a `<center>` header with title, authors and an optional date, one per
//!   `<br>`-separated line
//! - a two-column metadata table (published in, keywords, downloads, ...)
//! - the abstract, as loose text somewhere after the table
//!
//! Labels in the metadata table vary between papers, so keys are normalized
//! and looked up through a list of known variants.

use crate::html::{all_within, attr, following_text, selectors, text_of, Page};
use crate::model::ParsedPaper;
use crate::parser::keywords::split_keywords;
use crate::url::{detail_url, resolve_download_url};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

/// `<title>` the archive serves for ids that do not exist
pub const NOT_FOUND_TITLE: &str = "lingbuzz - archive of linguistics articles";

/// Marker that starts a file-format note instead of an abstract
const FORMAT_MARKER: &str = "Format:";

const PUBLISHED_IN_KEYS: &[&str] = &["published in", "publication", "published"];
const KEYWORD_KEYS: &[&str] = &["keywords", "key words", "key-words"];
const DOWNLOAD_KEYS: &[&str] = &["downloaded", "downloads", "downloaded times"];

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break regex is valid"));

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("integer regex is valid"));

/// Parses detail pages into validated `ParsedPaper` records
#[derive(Debug, Clone)]
pub struct DetailPageParser {
    base_url: Url,
}

impl DetailPageParser {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    /// Parses a detail page
    ///
    /// Returns `None` when the archive served its not-found page, when the
    /// header lacks a title or author line, or when the assembled record
    /// fails validation. Each case is logged.
    pub fn parse(&self, html: &str, external_id: &str) -> Option<ParsedPaper> {
        let page = Page::parse(html);

        if page.title().as_deref() == Some(NOT_FOUND_TITLE) {
            tracing::info!(external_id, "No paper found");
            return None;
        }

        let header = header_lines(&page);
        if header.len() < 2 {
            tracing::warn!(external_id, lines = header.len(), "Missing header data");
            return None;
        }

        let title = normalize_text(&header[0]);
        let authors: Vec<String> = normalize_text(&header[1])
            .split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        let date = header.get(2).map(|d| normalize_text(d)).unwrap_or_default();

        let table = metadata_table(&page);
        let published_in = normalize_text(table_value(&table, PUBLISHED_IN_KEYS));
        let keywords_raw = normalize_text(table_value(&table, KEYWORD_KEYS));
        let keywords = split_keywords(&keywords_raw);
        let download_count = parse_download_count(table_value(&table, DOWNLOAD_KEYS));

        let raw_abstract = raw_abstract(&page);
        let abstract_text = if raw_abstract.trim_start().starts_with(FORMAT_MARKER) {
            String::new()
        } else {
            normalize_text(&raw_abstract)
        };

        tracing::debug!(external_id, authors = authors.len(), "Parsed detail page header");

        let paper = ParsedPaper {
            external_id: external_id.to_string(),
            title,
            date,
            published_in,
            keywords_raw,
            keywords,
            abstract_text,
            download_count,
            download_url: self.pdf_link(&page).unwrap_or_default(),
            detail_url: detail_url(&self.base_url, external_id),
        };

        match paper.validate() {
            Ok(()) => Some(paper),
            Err(e) => {
                tracing::warn!(external_id, error = %e, "Validation failed for paper");
                None
            }
        }
    }

    /// First link on the page pointing at a PDF
    fn pdf_link(&self, page: &Page) -> Option<String> {
        page.all_matching(&selectors::LINK_WITH_HREF)
            .into_iter()
            .filter_map(|a| attr(a, "href"))
            .filter_map(|href| resolve_download_url(&self.base_url, href))
            .find(|url| url.to_ascii_lowercase().ends_with(".pdf"))
    }
}

/// Header lines from the `<center>` block, inner markup stripped, blanks dropped
fn header_lines(page: &Page) -> Vec<String> {
    let Some(center) = page.find_first(&selectors::DETAIL_HEADER) else {
        return Vec::new();
    };

    LINE_BREAK
        .split(&center.inner_html())
        .map(|line| Page::fragment(line).text())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Key/value pairs from the metadata table, keyed by normalized label
fn metadata_table(page: &Page) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    let Some(table) = page.find_first(&selectors::DETAIL_TABLE) else {
        return entries;
    };

    for row in all_within(table, &selectors::ROW) {
        let cells: Vec<String> = all_within(row, &selectors::CELL)
            .into_iter()
            .map(text_of)
            .filter(|text| !text.is_empty())
            .collect();

        if cells.len() >= 2 {
            entries.insert(normalize_key(&cells[0]), cells[1].clone());
        }
    }

    entries
}

/// Lowercases, collapses whitespace and drops the trailing colon of a label
fn normalize_key(label: &str) -> String {
    label
        .trim()
        .trim_end_matches(':')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// First non-empty value among the key variants
fn table_value<'a>(table: &'a HashMap<String, String>, keys: &[&str]) -> &'a str {
    keys.iter()
        .filter_map(|key| table.get(*key))
        .find(|value| !value.is_empty())
        .map(String::as_str)
        .unwrap_or_default()
}

/// First integer in the value, 0 when there is none
fn parse_download_count(value: &str) -> u64 {
    INTEGER
        .find(value)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// First block of loose text after the metadata table, or after the header
/// when the page has no table
fn raw_abstract(page: &Page) -> String {
    page.find_first(&selectors::DETAIL_TABLE)
        .or_else(|| page.find_first(&selectors::DETAIL_HEADER))
        .and_then(following_text)
        .unwrap_or_default()
}

/// Double quotes become single quotes, whitespace runs collapse to one space,
/// and control characters are dropped
pub fn normalize_text(value: &str) -> String {
    value
        .replace('"', "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}
