//! Quotebox Storage Layer
//!
//! SQLite-based key-value persistence with two areas:
//! - `Local`: survives across sessions
//! - `Session`: cleared when the session ends

mod database;
mod error;
mod kv;
mod migrations;

pub use database::{Database, StorageArea};
pub use error::StorageError;
pub use kv::{KeyValueStore, LocalStorage, MemoryStorage, SessionStorage};

pub type Result<T> = std::result::Result<T, StorageError>;
