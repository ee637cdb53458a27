//! Storage traits and error types
//!
//! This module defines the interface the crawler hands records to and the
//! associated error types.

use crate::extract::SearchableContent;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Errors that can occur during storage operations
///
/// Any storage error is fatal to the crawl that produced it.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage receiver has been closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Receives one [`SearchableContent`] record per successfully extracted page
///
/// Ownership of the record moves into the sink; the crawler keeps no
/// reference. Implementations may persist synchronously or queue the record.
pub trait ContentSink: Send {
    /// Accepts a single record
    fn store(&mut self, content: SearchableContent) -> StorageResult<()>;
}

/// Queued hand-off: records are sent to a receiver owned elsewhere
impl ContentSink for UnboundedSender<SearchableContent> {
    fn store(&mut self, content: SearchableContent) -> StorageResult<()> {
        self.send(content).map_err(|_| StorageError::Closed)
    }
}

impl<S: ContentSink + ?Sized> ContentSink for Box<S> {
    fn store(&mut self, content: SearchableContent) -> StorageResult<()> {
        (**self).store(content)
    }
}
