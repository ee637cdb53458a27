//! SQLite storage implementation
//!
//! This module provides a SQLite-backed [`ContentSink`]. Records are upserted
//! by URL, so re-crawling a page replaces its previous content.

use crate::extract::SearchableContent;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ContentSink, StorageResult};
use crate::storage::{RunRecord, RunStatus, StoredPage};
use crate::url::extract_domain;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Separator for list columns (headings, keywords)
const LIST_SEPARATOR: &str = "\n";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
    run_id: Option<i64>,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn, run_id: None })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn, run_id: None })
    }

    // ===== Run Management =====

    /// Records the start of a crawl run; later records are attributed to it
    pub fn begin_run(&mut self, seed: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (seed, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![seed, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        let run_id = self.conn.last_insert_rowid();
        self.run_id = Some(run_id);
        Ok(run_id)
    }

    /// Marks a run as finished
    pub fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs
             SET finished_at = ?1,
                 status = ?2,
                 records_stored = (SELECT COUNT(*) FROM pages WHERE run_id = ?3)
             WHERE id = ?3",
            params![now, status.to_db_string(), run_id],
        )?;
        if self.run_id == Some(run_id) {
            self.run_id = None;
        }
        Ok(())
    }

    /// Gets a run by ID
    pub fn get_run(&self, run_id: i64) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, seed, started_at, finished_at, config_hash, status, records_stored
                 FROM runs WHERE id = ?1",
                params![run_id],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        seed: row.get(1)?,
                        started_at: row.get(2)?,
                        finished_at: row.get(3)?,
                        config_hash: row.get(4)?,
                        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
                            .unwrap_or(RunStatus::Running),
                        records_stored: row.get(6)?,
                    })
                },
            )
            .optional()?;

        Ok(run)
    }

    // ===== Page Management =====

    /// Inserts or replaces the record for a URL
    pub fn upsert_page(&mut self, content: &SearchableContent) -> StorageResult<()> {
        let domain = extract_domain(&content.url).unwrap_or_default();
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO pages (url, domain, title, body_text, headings, keywords, extracted_at, run_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                body_text = excluded.body_text,
                headings = excluded.headings,
                keywords = excluded.keywords,
                extracted_at = excluded.extracted_at,
                run_id = excluded.run_id",
            params![
                content.url.as_str(),
                domain,
                content.title,
                content.text,
                content.headings.join(LIST_SEPARATOR),
                content.keywords.join(LIST_SEPARATOR),
                now,
                self.run_id,
            ],
        )?;

        Ok(())
    }

    /// Gets the stored record for a URL
    pub fn get_page(&self, url: &str) -> StorageResult<Option<StoredPage>> {
        let page = self
            .conn
            .query_row(
                "SELECT url, domain, title, body_text, headings, keywords, extracted_at, run_id
                 FROM pages WHERE url = ?1",
                params![url],
                |row| {
                    Ok(StoredPage {
                        url: row.get(0)?,
                        domain: row.get(1)?,
                        title: row.get(2)?,
                        text: row.get(3)?,
                        headings: split_list(&row.get::<_, String>(4)?),
                        keywords: split_list(&row.get::<_, String>(5)?),
                        extracted_at: row.get(6)?,
                        run_id: row.get(7)?,
                    })
                },
            )
            .optional()?;

        Ok(page)
    }

    /// Counts stored pages
    pub fn count_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl ContentSink for SqliteStorage {
    fn store(&mut self, content: SearchableContent) -> StorageResult<()> {
        self.upsert_page(&content)?;
        tracing::debug!("Stored content for {}", content.url);
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(LIST_SEPARATOR).map(str::to_string).collect()
}
