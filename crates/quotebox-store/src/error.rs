//! Store error types

use thiserror::Error;

use crate::remote::RemoteError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed import: {0}")]
    MalformedImport(String),

    #[error("Import contained no valid entries")]
    NoValidEntries,

    #[error("No quotes available for category: {0}")]
    EmptySelection(String),

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] quotebox_storage::StorageError),

    #[error("Stored quotes could not be read; not overwriting them")]
    SnapshotUnreadable,

    #[error("Sync failed: {0}")]
    SyncFailed(#[from] RemoteError),

    #[error("A sync is already in progress")]
    SyncInProgress,

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
