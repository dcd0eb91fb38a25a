//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage quota exceeded: {size} bytes written, quota is {quota} bytes")]
    QuotaExceeded { size: usize, quota: usize },

    #[error("Storage is disabled")]
    Disabled,
}
