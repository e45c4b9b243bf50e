//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::ParsedPaper;
use crate::output::RunStats;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{AuthorRecord, NewAuthor, PaperRecord, PendingPaper, RunRecord, RunStatus};
use crate::SyncError;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, mode, status,
     pages_processed, full_scrapes, version_updates, skipped, failed";

const PAPER_COLUMNS: &str = "id, external_id, title, paper_month, paper_year, published_in,
     keywords_raw, abstract, downloads, download_url, paper_url, created_at, updated_at, indexed_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> Result<Self, SyncError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, SyncError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Maps UNIQUE/CHECK/FOREIGN KEY failures to `ConstraintViolation`
fn constraint(err: rusqlite::Error, context: impl FnOnce() -> String) -> StorageError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            StorageError::ConstraintViolation(context())
        }
        other => StorageError::Sqlite(other),
    }
}

fn to_sql_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        mode: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Failed),
        pages_processed: row.get::<_, i64>(6)? as u64,
        full_scrapes: row.get::<_, i64>(7)? as u64,
        version_updates: row.get::<_, i64>(8)? as u64,
        skipped: row.get::<_, i64>(9)? as u64,
        failed: row.get::<_, i64>(10)? as u64,
    })
}

fn paper_from_row(row: &Row<'_>) -> rusqlite::Result<PaperRecord> {
    Ok(PaperRecord {
        id: row.get(0)?,
        external_id: row.get(1)?,
        title: row.get(2)?,
        paper_month: row.get(3)?,
        paper_year: row.get(4)?,
        published_in: row.get(5)?,
        keywords_raw: row.get(6)?,
        abstract_text: row.get(7)?,
        downloads: row.get::<_, i64>(8)? as u64,
        download_url: row.get(9)?,
        paper_url: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        indexed_at: row.get(13)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, mode: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, mode, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, mode, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats: &RunStats,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_processed = ?3,
             full_scrapes = ?4, version_updates = ?5, skipped = ?6, failed = ?7
             WHERE id = ?8",
            params![
                status.to_db_string(),
                now,
                to_sql_count(stats.pages_processed),
                to_sql_count(stats.full_scrapes),
                to_sql_count(stats.version_updates),
                to_sql_count(stats.skipped),
                to_sql_count(stats.failed),
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::NotFound(format!("Run {}", run_id)));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("Run {}", run_id)))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    // ===== Papers =====

    fn find_paper_by_external_id(&self, external_id: &str) -> StorageResult<Option<PaperRecord>> {
        let sql = format!("SELECT {} FROM papers WHERE external_id = ?1", PAPER_COLUMNS);
        let paper = self
            .conn
            .query_row(&sql, params![external_id], paper_from_row)
            .optional()?;
        Ok(paper)
    }

    fn insert_paper(&mut self, paper: &ParsedPaper) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let (month, year) = paper.month_and_year();

        self.conn
            .execute(
                "INSERT INTO papers (external_id, title, paper_month, paper_year, published_in,
                 keywords_raw, paper_reference, abstract, downloads, download_url, paper_url,
                 created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
                params![
                    paper.external_id,
                    paper.title,
                    month,
                    year,
                    paper.published_in,
                    paper.keywords_raw,
                    paper.reference(),
                    paper.abstract_text,
                    to_sql_count(paper.download_count),
                    paper.download_url,
                    paper.detail_url,
                    now
                ],
            )
            .map_err(|e| constraint(e, || format!("Paper {} already stored", paper.external_id)))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_paper_version(&mut self, paper_id: i64, paper: &ParsedPaper) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let (month, year) = paper.month_and_year();

        let updated = self.conn.execute(
            "UPDATE papers SET title = ?1, paper_month = ?2, paper_year = ?3, published_in = ?4,
             keywords_raw = ?5, abstract = ?6, downloads = ?7, download_url = ?8, updated_at = ?9
             WHERE id = ?10",
            params![
                paper.title,
                month,
                year,
                paper.published_in,
                paper.keywords_raw,
                paper.abstract_text,
                to_sql_count(paper.download_count),
                paper.download_url,
                now,
                paper_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::NotFound(format!("Paper ID {}", paper_id)));
        }
        Ok(())
    }

    // ===== Keywords =====

    fn upsert_keyword(&mut self, keyword: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO keywords (keyword) VALUES (?1)",
            params![keyword],
        )?;
        Ok(())
    }

    fn find_keyword_id(&self, keyword: &str) -> StorageResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM keywords WHERE keyword = ?1",
                params![keyword],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn insert_keyword_paper(&mut self, keyword_id: i64, paper_id: i64) -> StorageResult<()> {
        self.conn
            .execute(
                "INSERT INTO keywords_papers (keyword_id, paper_id) VALUES (?1, ?2)",
                params![keyword_id, paper_id],
            )
            .map_err(|e| {
                constraint(e, || {
                    format!("Keyword {} / paper {} relation", keyword_id, paper_id)
                })
            })?;
        Ok(())
    }

    fn keywords_for_paper(&self, paper_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT k.keyword FROM keywords k
             JOIN keywords_papers kp ON kp.keyword_id = k.id
             WHERE kp.paper_id = ?1
             ORDER BY k.keyword",
        )?;

        let rows = stmt.query_map(params![paper_id], |row| row.get(0))?;
        let mut keywords = Vec::new();
        for row in rows {
            keywords.push(row?);
        }
        Ok(keywords)
    }

    // ===== Authors =====

    fn find_author_by_username(&self, username: &str) -> StorageResult<Option<AuthorRecord>> {
        let author = self
            .conn
            .query_row(
                "SELECT id, username, first_name, last_name, email, affiliation, website
                 FROM authors WHERE username = ?1",
                params![username],
                |row| {
                    Ok(AuthorRecord {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                        email: row.get(4)?,
                        affiliation: row.get(5)?,
                        website: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(author)
    }

    fn insert_author(&mut self, author: &NewAuthor) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR IGNORE INTO authors
             (username, first_name, last_name, email, affiliation, website, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                author.username,
                author.first_name,
                author.last_name,
                author.email,
                author.affiliation,
                author.website,
                now
            ],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM authors WHERE username = ?1",
            params![author.username],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn insert_author_paper(
        &mut self,
        author_id: i64,
        paper_id: i64,
        position: u32,
    ) -> StorageResult<()> {
        self.conn
            .execute(
                "INSERT INTO authors_papers (author_id, paper_id, author_position) VALUES (?1, ?2, ?3)",
                params![author_id, paper_id, position],
            )
            .map_err(|e| {
                constraint(e, || {
                    format!("Author {} / paper {} relation", author_id, paper_id)
                })
            })?;
        Ok(())
    }

    fn authors_for_paper(&self, paper_id: i64) -> StorageResult<Vec<(u32, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT ap.author_position, a.username FROM authors a
             JOIN authors_papers ap ON ap.author_id = a.id
             WHERE ap.paper_id = ?1
             ORDER BY ap.author_position",
        )?;

        let rows = stmt.query_map(params![paper_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut authors = Vec::new();
        for row in rows {
            authors.push(row?);
        }
        Ok(authors)
    }

    // ===== Indexing =====

    fn papers_pending_index(&self, limit: usize) -> StorageResult<Vec<PendingPaper>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, external_id, title, abstract FROM papers
             WHERE indexed_at IS NULL
             ORDER BY id
             LIMIT ?1",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            Ok(PendingPaper {
                paper_id: row.get(0)?,
                external_id: row.get(1)?,
                title: row.get(2)?,
                abstract_text: row.get(3)?,
            })
        })?;

        let mut papers = Vec::new();
        for row in rows {
            papers.push(row?);
        }
        Ok(papers)
    }

    fn mark_indexed(&mut self, paper_ids: &[i64]) -> StorageResult<u64> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut touched = 0u64;
        {
            let mut stmt =
                tx.prepare("UPDATE papers SET indexed_at = ?1 WHERE id = ?2 AND indexed_at IS NULL")?;
            for id in paper_ids {
                touched += stmt.execute(params![now, id])? as u64;
            }
        }
        tx.commit()?;
        Ok(touched)
    }

    // ===== Statistics =====

    fn count_papers(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM papers")
    }

    fn count_authors(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM authors")
    }

    fn count_keywords(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM keywords")
    }

    fn count_author_relations(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM authors_papers")
    }

    fn count_keyword_relations(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM keywords_papers")
    }

    fn count_pending_index(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM papers WHERE indexed_at IS NULL")
    }
}
