//! Listing page URL generation
//!
//! The archive's first listing page holds 30 entries and every later page
//! holds 100, so starts run 1, 31, 131, 231, ...

use crate::parser::extract_paper_count;
use crate::sync::fetcher::Fetcher;
use crate::url::listing_url;
use crate::SyncError;
use url::Url;

/// Offset of the first listing page
pub const FIRST_START: u64 = 1;

/// Offset of the second listing page
pub const SECOND_START: u64 = 31;

/// Entries per listing page after the first
pub const PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone)]
pub struct ListingPaginator {
    base_url: Url,
}

impl ListingPaginator {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    /// Page start offsets covering `total` entries
    pub fn starts(total: u64) -> Vec<u64> {
        let mut starts = Vec::new();
        let mut start = FIRST_START;

        while start <= total {
            starts.push(start);
            match Self::next_start(start) {
                Some(next) => start = next,
                None => break,
            }
        }

        starts
    }

    /// Start of the page after the one at `start`, `None` past `u64::MAX`
    fn next_start(start: u64) -> Option<u64> {
        if start == FIRST_START {
            Some(SECOND_START)
        } else {
            start.checked_add(PAGE_SIZE)
        }
    }

    /// Listing page URLs covering `total` entries, in order
    pub fn urls(&self, total: u64) -> Vec<String> {
        Self::starts(total)
            .into_iter()
            .map(|start| listing_url(&self.base_url, start))
            .collect()
    }

    /// Reads the archive's total entry count off its front page
    ///
    /// A missing count element or a count without digits is fatal.
    pub async fn discover_total(&self, fetcher: &Fetcher) -> Result<u64, SyncError> {
        let html = fetcher.get_text(self.base_url.as_str()).await?;
        let total = extract_paper_count(&html)?;
        tracing::info!(total, "Discovered archive size");
        Ok(total)
    }

    /// Listing URLs for `total`, discovering the total first when not given
    pub async fn resolve(
        &self,
        fetcher: &Fetcher,
        total: Option<u64>,
    ) -> Result<Vec<String>, SyncError> {
        let total = match total {
            Some(total) => total,
            None => self.discover_total(fetcher).await?,
        };
        Ok(self.urls(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserAgentConfig;
    use crate::sync::fetcher::{build_http_client, RetryPolicy};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        let config = UserAgentConfig {
            crawler_name: "TestSync".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        };
        Fetcher::new(
            build_http_client(&config, Duration::from_secs(5)).unwrap(),
            RetryPolicy {
                max_retries: 0,
                base_delay: Duration::from_millis(1),
            },
        )
    }

    #[test]
    fn test_starts_for_130() {
        assert_eq!(ListingPaginator::starts(130), vec![1, 31]);
    }

    #[test]
    fn test_starts_boundaries() {
        assert_eq!(ListingPaginator::starts(0), Vec::<u64>::new());
        assert_eq!(ListingPaginator::starts(1), vec![1]);
        assert_eq!(ListingPaginator::starts(30), vec![1]);
        assert_eq!(ListingPaginator::starts(31), vec![1, 31]);
        assert_eq!(ListingPaginator::starts(131), vec![1, 31, 131]);
        assert_eq!(ListingPaginator::starts(450), vec![1, 31, 131, 231, 331, 431]);
    }

    #[test]
    fn test_next_start_stops_at_u64_max() {
        assert_eq!(ListingPaginator::next_start(1), Some(31));
        assert_eq!(ListingPaginator::next_start(31), Some(131));
        assert_eq!(ListingPaginator::next_start(u64::MAX - PAGE_SIZE), Some(u64::MAX));
        assert_eq!(ListingPaginator::next_start(u64::MAX - 50), None);
    }

    #[test]
    fn test_urls() {
        let paginator = ListingPaginator::new(Url::parse("https://ling.auf.net/").unwrap());
        assert_eq!(
            paginator.urls(130),
            vec![
                "https://ling.auf.net/lingbuzz/_listing?start=1",
                "https://ling.auf.net/lingbuzz/_listing?start=31",
            ]
        );
    }

    #[tokio::test]
    async fn test_discover_total_from_front_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><center><b><a href=\"/lingbuzz\">lingbuzz\n <i>now</i> 250</a></b></center></body></html>",
            ))
            .mount(&server)
            .await;

        let paginator = ListingPaginator::new(Url::parse(&server.uri()).unwrap());
        let urls = paginator.resolve(&fetcher(), None).await.unwrap();

        assert_eq!(urls.len(), 4);
        assert!(urls[2].ends_with("/lingbuzz/_listing?start=131"));
        assert!(urls[3].ends_with("/lingbuzz/_listing?start=231"));
    }

    #[tokio::test]
    async fn test_discovery_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&server)
            .await;

        let paginator = ListingPaginator::new(Url::parse(&server.uri()).unwrap());
        let result = paginator.resolve(&fetcher(), None).await;
        assert!(matches!(result, Err(SyncError::Discovery(_))));
    }

    #[tokio::test]
    async fn test_explicit_total_skips_discovery() {
        let server = MockServer::start().await;
        let paginator = ListingPaginator::new(Url::parse(&server.uri()).unwrap());

        let urls = paginator.resolve(&fetcher(), Some(31)).await.unwrap();

        assert_eq!(urls.len(), 2);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
