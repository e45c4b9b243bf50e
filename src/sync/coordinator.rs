//! Sync coordinator - main run orchestration logic
//!
//! This module drives one sync run:
//! - Recording the run in storage
//! - Generating listing page URLs (discovering the archive size if needed)
//! - Fetching listing pages strictly in sequence
//! - Classifying rows and processing them under the concurrency limiter
//! - Folding row outcomes into the run statistics

use crate::config::Config;
use crate::model::{ListingRow, ScrapeAction};
use crate::output::{RowOutcome, RunStats};
use crate::parser::{extract_listing_rows, DetailPageParser};
use crate::storage::{lock_storage, open_storage, RunStatus, SqliteStorage, Storage, StorageError};
use crate::sync::classify::classify_rows;
use crate::sync::fetcher::Fetcher;
use crate::sync::limiter::map_with_concurrency;
use crate::sync::paginator::ListingPaginator;
use crate::sync::persist::PersistenceEngine;
use crate::SyncError;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use url::Url;

/// How far a run walks the listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Stop at the first listing page with nothing new or changed
    #[default]
    Incremental,

    /// Walk every listing page
    Full,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Full => "full",
        }
    }
}

/// Main sync coordinator structure
pub struct Coordinator<S> {
    config: Arc<Config>,
    config_hash: String,
    mode: SyncMode,
    base_url: Url,
    storage: Arc<Mutex<S>>,
    fetcher: Fetcher,
    parser: DetailPageParser,
    engine: PersistenceEngine<S>,
}

impl Coordinator<SqliteStorage> {
    /// Creates a coordinator over the database named in the configuration
    pub fn new(config: Config, config_hash: String, mode: SyncMode) -> Result<Self, SyncError> {
        let storage = open_storage(Path::new(&config.output.database_path))?;
        Self::with_storage(config, config_hash, mode, Arc::new(Mutex::new(storage)))
    }
}

impl<S: Storage> Coordinator<S> {
    /// Creates a coordinator over existing shared storage
    pub fn with_storage(
        config: Config,
        config_hash: String,
        mode: SyncMode,
        storage: Arc<Mutex<S>>,
    ) -> Result<Self, SyncError> {
        let base_url = Url::parse(&config.archive.base_url)?;
        let fetcher = Fetcher::from_config(&config)?;
        let profile_fetcher = config.fetch.enrich_authors.then(|| fetcher.clone());

        Ok(Self {
            config_hash,
            mode,
            parser: DetailPageParser::new(base_url.clone()),
            engine: PersistenceEngine::new(Arc::clone(&storage), profile_fetcher),
            base_url,
            storage,
            fetcher,
            config: Arc::new(config),
        })
    }

    pub fn storage(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.storage)
    }

    /// Runs one sync
    ///
    /// `total` replaces archive size discovery when given. The run is recorded
    /// as `completed` or `failed` before this returns.
    pub async fn run(&self, total: Option<u64>) -> Result<RunStats, SyncError> {
        let started = Instant::now();
        let run_id = lock_storage(&self.storage)?.create_run(&self.config_hash, self.mode.as_str())?;
        tracing::info!(run_id, mode = self.mode.as_str(), "Starting sync run");

        let mut stats = RunStats::new();
        let result = self.sync_pages(total, &mut stats).await;
        stats.duration = started.elapsed();

        let status = if result.is_ok() {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };
        let finished =
            lock_storage(&self.storage).and_then(|mut s| s.finish_run(run_id, status, &stats));

        match result {
            Ok(()) => {
                finished?;
                tracing::info!(
                    run_id,
                    pages = stats.pages_processed,
                    fetched = stats.actionable(),
                    full_scrapes = stats.full_scrapes,
                    version_updates = stats.version_updates,
                    skipped = stats.skipped,
                    failed = stats.failed,
                    "Sync run completed in {:?}",
                    stats.duration
                );
                Ok(stats)
            }
            Err(e) => {
                if let Err(record_error) = finished {
                    tracing::error!(run_id, error = %record_error, "Could not record failed run");
                }
                tracing::error!(run_id, error = %e, "Sync run failed");
                Err(e)
            }
        }
    }

    async fn sync_pages(&self, total: Option<u64>, stats: &mut RunStats) -> Result<(), SyncError> {
        let paginator = ListingPaginator::new(self.base_url.clone());
        let urls = paginator.resolve(&self.fetcher, total).await?;
        tracing::info!(pages = urls.len(), "Generated listing page URLs");

        let limit = self.config.fetch.max_concurrent_requests as usize;

        for url in urls {
            let html = self.fetcher.get_text(&url).await?;
            let rows = extract_listing_rows(&html, &self.base_url);
            let actions = classify_rows(&rows, self.storage.as_ref())?;
            let actionable = actions.iter().filter(|a| !a.is_skip()).count();

            tracing::info!(url = %url, rows = rows.len(), actionable, "Processing listing page");

            let outcomes = map_with_concurrency(actions, limit, |action| self.process(action)).await?;
            for outcome in outcomes {
                stats.record(outcome);
            }
            stats.pages_processed += 1;

            if self.mode == SyncMode::Incremental && actionable == 0 {
                tracing::info!(url = %url, "Nothing new on listing page, stopping");
                break;
            }
        }

        Ok(())
    }

    async fn process(&self, action: ScrapeAction) -> Result<RowOutcome, SyncError> {
        match action {
            ScrapeAction::Skip { row, reason } => {
                tracing::debug!(id = %row.id, reason = %reason, "Skipping row");
                Ok(RowOutcome::Skipped)
            }
            ScrapeAction::FullScrape(row) => self.scrape(&row, false).await,
            ScrapeAction::UpdateVersion(row) => self.scrape(&row, true).await,
        }
    }

    /// Fetches, parses and stores one paper
    ///
    /// Every failure is confined to the row except a poisoned storage lock,
    /// which would fail every following row as well.
    async fn scrape(&self, row: &ListingRow, update: bool) -> Result<RowOutcome, SyncError> {
        let html = match self.fetcher.get_text(&row.detail_url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(id = %row.id, error = %e, "Detail page fetch failed");
                return Ok(RowOutcome::Failed);
            }
        };

        let Some(mut paper) = self.parser.parse(&html, &row.id) else {
            return Ok(RowOutcome::Failed);
        };
        if paper.download_url.is_empty() {
            paper.download_url = row.download_url.clone();
        }

        let stored = if update {
            self.engine.update_version(&paper, &row.authors).await
        } else {
            self.engine.persist(&paper, &row.authors).await
        };

        match stored {
            Ok(paper_id) => {
                tracing::info!(id = %row.id, paper_id, update, "Stored paper");
                Ok(if update {
                    RowOutcome::VersionUpdate
                } else {
                    RowOutcome::FullScrape
                })
            }
            Err(e @ SyncError::Storage(StorageError::LockPoisoned)) => Err(e),
            Err(e) => {
                tracing::error!(id = %row.id, error = %e, "Failed to store paper");
                Ok(RowOutcome::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArchiveConfig, FetchConfig, OutputConfig, UserAgentConfig};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> Config {
        Config {
            archive: ArchiveConfig {
                base_url: base_url.to_string(),
            },
            fetch: FetchConfig {
                max_retries: 0,
                retry_base_delay_ms: 1,
                enrich_authors: false,
                ..FetchConfig::default()
            },
            user_agent: UserAgentConfig {
                crawler_name: "TestSync".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                database_path: ":memory:".to_string(),
            },
        }
    }

    fn coordinator(server: &MockServer, mode: SyncMode) -> Coordinator<SqliteStorage> {
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        Coordinator::with_storage(config(&server.uri()), "hash".to_string(), mode, storage).unwrap()
    }

    fn listing_page(rows: &[(&str, &str)]) -> String {
        let rows: String = rows
            .iter()
            .map(|(id, status)| {
                format!(
                    r#"<tr>
                        <td><a href="/_person/author{id}">Author, Some</a></td>
                        <td>{status}</td>
                        <td><a href="/lingbuzz/{id}/current.pdf">pdf</a></td>
                        <td><a href="/lingbuzz/{id}">Paper {id}</a></td>
                    </tr>"#
                )
            })
            .collect();

        format!(
            "<html><body><table><tr><td>h</td></tr></table><table><tr><td>n</td></tr></table>\
             <table><tr><td><table>{}</table></td></tr></table></body></html>",
            rows
        )
    }

    fn detail_page(id: &str) -> String {
        format!(
            r#"<html><head><title>Paper {id}</title></head><body>
                <center>Paper {id}<br>Some Author<br>May 2025</center>
                <table><tr><td>keywords:</td><td>syntax, phonology</td></tr></table>
                Abstract of {id}.
            </body></html>"#
        )
    }

    async fn mount_listing(server: &MockServer, start: &str, body: String) {
        Mock::given(method("GET"))
            .and(path("/lingbuzz/_listing"))
            .and(query_param("start", start))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn mount_detail(server: &MockServer, id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/lingbuzz/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(id)))
            .mount(server)
            .await;
    }

    #[test]
    fn test_sync_mode_strings() {
        assert_eq!(SyncMode::default(), SyncMode::Incremental);
        assert_eq!(SyncMode::Full.as_str(), "full");
    }

    #[tokio::test]
    async fn test_incremental_run_stops_on_page_without_work() {
        let server = MockServer::start().await;
        mount_listing(&server, "1", listing_page(&[("000010", "new"), ("000009", "new")])).await;
        mount_listing(&server, "31", listing_page(&[("000010", "2025-01")])).await;
        mount_listing(&server, "131", listing_page(&[("000001", "2024-01")])).await;
        mount_detail(&server, "000010").await;
        mount_detail(&server, "000009").await;

        let coordinator = coordinator(&server, SyncMode::Incremental);
        let stats = coordinator.run(Some(200)).await.unwrap();

        assert_eq!(stats.pages_processed, 2);
        assert_eq!(stats.full_scrapes, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 0);

        let requests = server.received_requests().await.unwrap();
        assert!(!requests
            .iter()
            .any(|r| r.url.query() == Some("start=131")));

        let storage = coordinator.storage();
        let storage = storage.lock().unwrap();
        let paper = storage.find_paper_by_external_id("000010").unwrap().unwrap();
        assert_eq!(paper.paper_month, "May");
        assert_eq!(paper.abstract_text, "Abstract of 000010.");
        assert!(paper.download_url.ends_with("/lingbuzz/000010/current.pdf"));
        assert_eq!(storage.count_keywords().unwrap(), 2);

        let run = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.full_scrapes, 2);
    }

    #[tokio::test]
    async fn test_full_run_walks_every_page() {
        let server = MockServer::start().await;
        mount_listing(&server, "1", listing_page(&[("000010", "new")])).await;
        mount_listing(&server, "31", listing_page(&[("000010", "2025-01")])).await;
        mount_detail(&server, "000010").await;

        let coordinator = coordinator(&server, SyncMode::Full);
        coordinator.run(Some(31)).await.unwrap();
        let stats = coordinator.run(Some(31)).await.unwrap();

        assert_eq!(stats.pages_processed, 2);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.full_scrapes, 0);
    }

    #[tokio::test]
    async fn test_freshly_changed_and_failed_rows() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            "1",
            listing_page(&[("000010", "freshly changed"), ("000011", "new")]),
        )
        .await;
        mount_detail(&server, "000010").await;
        Mock::given(method("GET"))
            .and(path("/lingbuzz/000011"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let coordinator = coordinator(&server, SyncMode::Incremental);
        let stats = coordinator.run(Some(30)).await.unwrap();

        assert_eq!(stats.version_updates, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pages_processed, 1);
    }

    #[tokio::test]
    async fn test_listing_fetch_failure_fails_the_run() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let coordinator = coordinator(&server, SyncMode::Incremental);
        let result = coordinator.run(Some(30)).await;

        assert!(matches!(result, Err(SyncError::FetchExhausted { .. })));
        let storage = coordinator.storage();
        let run = storage.lock().unwrap().get_latest_run().unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.finished_at.is_some());
    }
}
