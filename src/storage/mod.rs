//! Storage module: the collaborators that receive extracted records
//!
//! This module provides:
//! - The [`ContentSink`] trait the crawler hands records to
//! - SQLite persistence with run tracking
//! - An in-memory sink for tests and embedding
//! - A channel sink (`tokio::sync::mpsc::UnboundedSender`) for queued hand-off

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{ContentSink, StorageError, StorageResult};

use crate::extract::SearchableContent;

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            "cancelled" => Some(RunStatus::Cancelled),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

/// Represents a crawl run in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub seed: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub records_stored: i64,
}

/// Represents a stored page record
#[derive(Debug, Clone)]
pub struct StoredPage {
    pub url: String,
    pub domain: String,
    pub title: String,
    pub text: String,
    pub headings: Vec<String>,
    pub keywords: Vec<String>,
    pub extracted_at: String,
    pub run_id: Option<i64>,
}

/// Keeps every record in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Vec<SearchableContent>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[SearchableContent] {
        &self.records
    }

    pub fn into_records(self) -> Vec<SearchableContent> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ContentSink for MemoryStorage {
    fn store(&mut self, content: SearchableContent) -> StorageResult<()> {
        self.records.push(content);
        Ok(())
    }
}
