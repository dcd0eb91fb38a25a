//! Key-value store seam used by the quote store

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::database::{Database, StorageArea};
use crate::error::StorageError;
use crate::Result;

/// A string-keyed, string-valued storage area.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Durable storage, optionally bounded by a per-value byte quota.
#[derive(Clone)]
pub struct LocalStorage {
    db: Database,
    quota_bytes: Option<usize>,
}

impl LocalStorage {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            quota_bytes: None,
        }
    }

    pub fn with_quota(db: Database, quota_bytes: usize) -> Self {
        Self {
            db,
            quota_bytes: Some(quota_bytes),
        }
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.db.get_item(StorageArea::Local, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota_bytes {
            let size = key.len() + value.len();
            if size > quota {
                return Err(StorageError::QuotaExceeded { size, quota });
            }
        }
        self.db.set_item(StorageArea::Local, key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db.remove_item(StorageArea::Local, key)
    }
}

/// Session-scoped storage; everything in it goes away at `end_session`.
#[derive(Clone)]
pub struct SessionStorage {
    db: Database,
}

impl SessionStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn end_session(&self) -> Result<()> {
        self.db.clear_area(StorageArea::Session)?;
        tracing::info!("Session storage cleared");
        Ok(())
    }
}

impl KeyValueStore for SessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.db.get_item(StorageArea::Session, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db.set_item(StorageArea::Session, key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db.remove_item(StorageArea::Session, key)
    }
}

/// In-process storage. Writes can be switched off to model disabled storage.
#[derive(Default)]
pub struct MemoryStorage {
    items: Arc<RwLock<HashMap<String, String>>>,
    disabled: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// When disabled, `set` and `remove` fail with `StorageError::Disabled`.
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    fn check_enabled(&self) -> Result<()> {
        if self.disabled.load(Ordering::SeqCst) {
            return Err(StorageError::Disabled);
        }
        Ok(())
    }
}

impl Clone for MemoryStorage {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            disabled: Arc::clone(&self.disabled),
        }
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_enabled()?;
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_enabled()?;
        self.items.write().remove(key);
        Ok(())
    }
}
