//! Database connection and storage-area operations

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::Result;

/// Which key-value area an item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    /// Survives across sessions
    Local,
    /// Cleared when the session ends
    Session,
}

impl StorageArea {
    fn table(self) -> &'static str {
        match self {
            StorageArea::Local => "local_storage",
            StorageArea::Session => "session_storage",
        }
    }
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for better concurrent performance
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn get_item(&self, area: StorageArea, key: &str) -> Result<Option<String>> {
        let sql = format!("SELECT value FROM {} WHERE key = ?1", area.table());
        self.with_connection(|conn| {
            let value = conn
                .query_row(&sql, [key], |row| row.get(0))
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_item(&self, area: StorageArea, key: &str, value: &str) -> Result<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (key, value, updated_at) VALUES (?1, ?2, ?3)",
            area.table()
        );
        let updated_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(&sql, rusqlite::params![key, value, updated_at])?;
            Ok(())
        })
    }

    pub fn remove_item(&self, area: StorageArea, key: &str) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE key = ?1", area.table());
        self.with_connection(|conn| {
            conn.execute(&sql, [key])?;
            Ok(())
        })
    }

    pub fn clear_area(&self, area: StorageArea) -> Result<()> {
        let sql = format!("DELETE FROM {}", area.table());
        let removed = self.with_connection(|conn| Ok(conn.execute(&sql, [])?))?;
        tracing::debug!(area = ?area, removed, "Cleared storage area");
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}
