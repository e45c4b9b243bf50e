//! Integration tests for the sync pipeline
//!
//! These tests use wiremock to stand in for the archive and run whole
//! sync runs against real SQLite storage.

use lingbuzz_sync::config::{
    load_config_with_hash, ArchiveConfig, Config, FetchConfig, OutputConfig, UserAgentConfig,
};
use lingbuzz_sync::model::{ListingStatus, ParsedPaper, ScrapeAction};
use lingbuzz_sync::parser::extract_listing_rows;
use lingbuzz_sync::storage::{RunStatus, SqliteStorage, Storage};
use lingbuzz_sync::sync::{classify_rows, run_sync, Coordinator, SyncMode};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock archive
fn create_test_config(base_url: &str, db_path: &str, max_retries: u32) -> Config {
    Config {
        archive: ArchiveConfig {
            base_url: base_url.to_string(),
        },
        fetch: FetchConfig {
            max_retries,
            retry_base_delay_ms: 1,
            max_concurrent_requests: 2,
            request_timeout_secs: 5,
            enrich_authors: false,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestSync".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
    }
}

fn listing_row(id: &str, status: &str, authors: &[&str]) -> String {
    let links: Vec<String> = authors
        .iter()
        .map(|username| format!(r#"<a href="/_person/{username}">{username}, A.</a>"#))
        .collect();
    format!(
        r#"<tr>
            <td>{}</td>
            <td>{status}</td>
            <td><a href="/lingbuzz/{id}/current.pdf?_s=abc">pdf</a></td>
            <td><a href="/lingbuzz/{id}">Paper {id}</a></td>
        </tr>"#,
        links.join(", ")
    )
}

fn listing_page(rows: &[String]) -> String {
    format!(
        "<html><body><table><tr><td>header</td></tr></table>\
         <table><tr><td>nav</td></tr></table>\
         <table><tr><td><table>{}</table></td></tr></table></body></html>",
        rows.concat()
    )
}

fn detail_page(id: &str, keywords: &str) -> String {
    format!(
        r#"<html><head><title>Paper {id}</title></head><body>
            <center>Paper {id}<br>Some Author<br>March 2025</center>
            <table>
                <tr><td>Published in:</td><td>Journal of Tests</td></tr>
                <tr><td>keywords:</td><td>{keywords}</td></tr>
                <tr><td>Downloaded:</td><td>42 times</td></tr>
            </table>
            An abstract for paper {id}.
        </body></html>"#
    )
}

fn stored_paper(id: &str) -> ParsedPaper {
    ParsedPaper {
        external_id: id.to_string(),
        title: format!("Paper {}", id),
        date: "January 2024".to_string(),
        published_in: String::new(),
        keywords_raw: String::new(),
        keywords: vec![String::new()],
        abstract_text: String::new(),
        download_count: 0,
        download_url: String::new(),
        detail_url: format!("https://ling.auf.net/lingbuzz/{}", id),
    }
}

async fn mount_body(server: &MockServer, url_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_new_row_scraped_and_stored_row_skipped() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    let page = listing_page(&[
        listing_row("000020", "new", &["alpha", "beta"]),
        listing_row("000019", "2025-02", &["gamma"]),
    ]);
    Mock::given(method("GET"))
        .and(path("/lingbuzz/_listing"))
        .and(query_param("start", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page.clone()))
        .mount(&server)
        .await;
    mount_body(
        &server,
        "/lingbuzz/000020",
        detail_page("000020", "syntax, semantics, morphology"),
    )
    .await;

    // Paper B is already mirrored; the keyword relation for 'semantics' fails
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("mirror.db");
    let mut storage = SqliteStorage::new(&db_path).expect("Failed to open storage");
    storage
        .insert_paper(&stored_paper("000019"))
        .expect("Failed to seed paper");

    let conn = rusqlite::Connection::open(&db_path).expect("Failed to open second connection");
    conn.execute_batch(
        "CREATE TRIGGER fail_semantics BEFORE INSERT ON keywords_papers
         WHEN (SELECT keyword FROM keywords WHERE id = NEW.keyword_id) = 'semantics'
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .expect("Failed to create trigger");

    let storage = Arc::new(Mutex::new(storage));

    // Classification alone: A is new, B is stored
    let rows = extract_listing_rows(&page, &url::Url::parse(&base_url).unwrap());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].status, ListingStatus::Dated("2025-02".to_string()));
    let actions = classify_rows(&rows, storage.as_ref()).unwrap();
    assert!(matches!(&actions[0], ScrapeAction::FullScrape(row) if row.id == "000020"));
    assert!(matches!(&actions[1], ScrapeAction::Skip { row, .. } if row.id == "000019"));

    let config = create_test_config(&base_url, &db_path.to_string_lossy(), 0);
    let coordinator = Coordinator::with_storage(
        config,
        "test-hash".to_string(),
        SyncMode::Incremental,
        Arc::clone(&storage),
    )
    .expect("Failed to create coordinator");

    let stats = coordinator.run(Some(30)).await.expect("Sync run failed");

    assert_eq!(stats.pages_processed, 1);
    assert_eq!(stats.full_scrapes, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 0);

    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_papers().unwrap(), 2);

    let paper = storage
        .find_paper_by_external_id("000020")
        .unwrap()
        .expect("Paper A should be stored");
    assert_eq!(paper.title, "Paper 000020");
    assert_eq!(paper.paper_month, "March");
    assert_eq!(paper.paper_year, "2025");
    assert_eq!(paper.published_in, "Journal of Tests");
    assert_eq!(paper.downloads, 42);
    assert_eq!(paper.abstract_text, "An abstract for paper 000020.");
    assert_eq!(
        paper.download_url,
        format!("{}/lingbuzz/000020/current.pdf", base_url)
    );
    assert!(paper.indexed_at.is_none());

    assert_eq!(
        storage.keywords_for_paper(paper.id).unwrap(),
        vec!["morphology", "syntax"]
    );
    assert_eq!(
        storage.authors_for_paper(paper.id).unwrap(),
        vec![(1, "alpha".to_string()), (2, "beta".to_string())]
    );

    // The skipped row's detail page was never requested
    let requests = server.received_requests().await.unwrap();
    assert!(!requests.iter().any(|r| r.url.path() == "/lingbuzz/000019"));

    let run = storage.get_latest_run().unwrap().expect("Run should be recorded");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.mode, "incremental");
    assert_eq!(run.full_scrapes, 1);
    assert_eq!(run.skipped, 1);
}

#[tokio::test]
async fn test_detail_page_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lingbuzz/_listing"))
        .and(query_param("start", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&[listing_row("000030", "new", &["delta"])])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lingbuzz/000030"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_body(&server, "/lingbuzz/000030", detail_page("000030", "phonology")).await;

    let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    let config = create_test_config(&server.uri(), ":memory:", 3);
    let coordinator = Coordinator::with_storage(
        config,
        "test-hash".to_string(),
        SyncMode::Incremental,
        Arc::clone(&storage),
    )
    .unwrap();

    let stats = coordinator.run(Some(30)).await.unwrap();

    assert_eq!(stats.full_scrapes, 1);
    assert_eq!(stats.failed, 0);

    let detail_requests = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/lingbuzz/000030")
        .count();
    assert_eq!(detail_requests, 3);

    let storage = storage.lock().unwrap();
    assert!(storage.find_paper_by_external_id("000030").unwrap().is_some());
}

#[tokio::test]
async fn test_run_from_config_file_discovers_archive_size() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_body(
        &server,
        "/",
        "<html><body><center><b><a href=\"/lingbuzz\">lingbuzz <i>now</i> 12</a></b></center></body></html>"
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/lingbuzz/_listing"))
        .and(query_param("start", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[
            listing_row("000040", "freshly changed", &["epsilon"]),
        ])))
        .mount(&server)
        .await;
    mount_body(&server, "/lingbuzz/000040", detail_page("000040", "syntax")).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("mirror.db");
    let config_path = dir.path().join("lingbuzz.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[archive]
base-url = "{base_url}"

[fetch]
max-retries = 0
retry-base-delay-ms = 1
enrich-authors = false

[user-agent]
crawler-name = "TestSync"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
database-path = "{}"
"#,
            db_path.to_string_lossy()
        ),
    )
    .unwrap();

    let (config, hash) = load_config_with_hash(&config_path).expect("Failed to load config");
    let stats = run_sync(config, hash.clone(), SyncMode::Full, None)
        .await
        .expect("Sync run failed");

    assert_eq!(stats.pages_processed, 1);
    assert_eq!(stats.version_updates, 1);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_papers().unwrap(), 1);
    assert_eq!(storage.count_pending_index().unwrap(), 1);

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.config_hash, hash);
    assert_eq!(run.mode, "full");
    assert_eq!(run.version_updates, 1);
}
