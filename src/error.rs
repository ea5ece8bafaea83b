//! Crate-wide error types, one enum per failure category from the design doc.

use std::io;

/// Failure to open or iterate a document source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to open source: {0}")]
    Open(String),

    #[error("failed to read row: {0}")]
    Read(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Errors surfaced while building an index.
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("format error: {0}")]
    Format(String),
}

/// Errors surfaced while loading an index or executing a query.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("format error: {0}")]
    Format(String),

    #[error("usage error: {0}")]
    Usage(String),
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::Format(format!("index_meta.json: {e}"))
    }
}

impl From<serde_json::Error> for IndexerError {
    fn from(e: serde_json::Error) -> Self {
        IndexerError::Format(format!("index_meta.json: {e}"))
    }
}
