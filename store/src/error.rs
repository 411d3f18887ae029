//! Error types for the store

use thiserror::Error;

/// Errors produced by [`crate::Store`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index error: {0}")]
    Index(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("failed to acquire store lock: {0}")]
    Lock(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
