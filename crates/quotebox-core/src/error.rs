//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] quotebox_storage::StorageError),

    #[error(transparent)]
    Store(#[from] quotebox_store::StoreError),

    #[error("Remote error: {0}")]
    Remote(#[from] quotebox_store::RemoteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
