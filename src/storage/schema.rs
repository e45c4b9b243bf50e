//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the lingbuzz-sync database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track sync runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    mode TEXT NOT NULL,
    status TEXT NOT NULL,
    pages_processed INTEGER NOT NULL DEFAULT 0,
    full_scrapes INTEGER NOT NULL DEFAULT 0,
    version_updates INTEGER NOT NULL DEFAULT 0,
    skipped INTEGER NOT NULL DEFAULT 0,
    failed INTEGER NOT NULL DEFAULT 0
);

-- One row per archive paper
CREATE TABLE IF NOT EXISTS papers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    paper_month TEXT NOT NULL DEFAULT '',
    paper_year TEXT NOT NULL DEFAULT '',
    published_in TEXT NOT NULL DEFAULT '',
    keywords_raw TEXT NOT NULL DEFAULT '',
    paper_reference TEXT NOT NULL,
    abstract TEXT NOT NULL DEFAULT '',
    downloads INTEGER NOT NULL DEFAULT 0 CHECK (downloads >= 0),
    download_url TEXT NOT NULL DEFAULT '',
    paper_url TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    indexed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_papers_indexed_at ON papers(indexed_at);

CREATE TABLE IF NOT EXISTS keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS authors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    affiliation TEXT NOT NULL DEFAULT '',
    website TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS keywords_papers (
    keyword_id INTEGER NOT NULL REFERENCES keywords(id),
    paper_id INTEGER NOT NULL REFERENCES papers(id),
    PRIMARY KEY (keyword_id, paper_id)
);

CREATE INDEX IF NOT EXISTS idx_keywords_papers_paper ON keywords_papers(paper_id);

CREATE TABLE IF NOT EXISTS authors_papers (
    author_id INTEGER NOT NULL REFERENCES authors(id),
    paper_id INTEGER NOT NULL REFERENCES papers(id),
    author_position INTEGER NOT NULL CHECK (author_position >= 1),
    PRIMARY KEY (author_id, paper_id)
);

CREATE INDEX IF NOT EXISTS idx_authors_papers_paper ON authors_papers(paper_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
