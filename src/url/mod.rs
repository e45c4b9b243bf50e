//! Archive URL helpers
//!
//! Every URL the sync builds or reads off a page goes through here, so the
//! archive's link conventions live in one place:
//! - `/lingbuzz/<6 digits>` for detail pages
//! - `/lingbuzz/_listing?start=<n>` for listing pages
//! - `/_person/<username>` for author profiles

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static PAPER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/lingbuzz/(\d{6})").expect("paper id regex is valid"));

static PERSON_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/_person/(.*)").expect("person regex is valid"));

fn root(base: &Url) -> &str {
    base.as_str().trim_end_matches('/')
}

/// Detail page URL for an archive id
pub fn detail_url(base: &Url, id: &str) -> String {
    format!("{}/lingbuzz/{}", root(base), id)
}

/// Listing page URL starting at the given 1-based offset
pub fn listing_url(base: &Url, start: u64) -> String {
    format!("{}/lingbuzz/_listing?start={}", root(base), start)
}

/// Pulls the six digit id out of a detail link
pub fn extract_paper_id(href: &str) -> Option<String> {
    PAPER_ID_PATTERN
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Username from a profile link, percent-decoded
///
/// Returns an empty string when the link is not a profile link.
pub fn extract_username(href: &str) -> String {
    let decoded = urlencoding::decode(href)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| href.to_string());

    PERSON_PATTERN
        .captures(&decoded)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Resolves a link against the archive root, keeping it as-is if it cannot be resolved
pub fn resolve_link(base: &Url, href: &str) -> String {
    base.join(href.trim())
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolves a download link against the archive root with query and fragment removed
pub fn resolve_download_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://ling.auf.net").unwrap()
    }

    #[test]
    fn test_detail_and_listing_urls() {
        assert_eq!(
            detail_url(&base(), "007001"),
            "https://ling.auf.net/lingbuzz/007001"
        );
        assert_eq!(
            listing_url(&base(), 31),
            "https://ling.auf.net/lingbuzz/_listing?start=31"
        );
    }

    #[test]
    fn test_extract_paper_id() {
        assert_eq!(
            extract_paper_id("/lingbuzz/007001"),
            Some("007001".to_string())
        );
        assert_eq!(
            extract_paper_id("https://ling.auf.net/lingbuzz/005000/current.pdf"),
            Some("005000".to_string())
        );
        assert_eq!(extract_paper_id("/lingbuzz/_listing?start=1"), None);
        assert_eq!(extract_paper_id("/lingbuzz/12345"), None);
    }

    #[test]
    fn test_extract_username() {
        assert_eq!(extract_username("/_person/jdoe"), "jdoe");
        assert_eq!(
            extract_username("https://ling.auf.net/_person/Jos%C3%A9%20Garc%C3%ADa"),
            "José García"
        );
        assert_eq!(extract_username("/lingbuzz/007001"), "");
    }

    #[test]
    fn test_resolve_download_url_strips_query() {
        assert_eq!(
            resolve_download_url(&base(), "/lingbuzz/007001/current.pdf?_s=abc"),
            Some("https://ling.auf.net/lingbuzz/007001/current.pdf".to_string())
        );
        assert_eq!(resolve_download_url(&base(), "  "), None);
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(
            resolve_link(&base(), "/_person/jdoe"),
            "https://ling.auf.net/_person/jdoe"
        );
        assert_eq!(
            resolve_link(&base(), "https://other.org/x"),
            "https://other.org/x"
        );
    }
}
