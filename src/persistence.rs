//! Key-value persistence for settings, tasks and daily records.
//!
//! Values are JSON blobs stored under string keys. [`Repository`] is the
//! typed face of a [`KeyValueStore`]: reads fall back to defaults and
//! writes report success as a bool, so no storage problem ever reaches the
//! timer.

use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const KEY_SETTINGS: &str = "settings";
pub const KEY_TASKS: &str = "tasks";
pub const KEY_RECORDS: &str = "pomodoroRecords";

/// Every key the application writes.
pub const ALL_KEYS: [&str; 3] = [KEY_SETTINGS, KEY_TASKS, KEY_RECORDS];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Malformed data under '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create database directory")]
    DirectoryCreation,
    #[error("Storage unavailable")]
    Unavailable,
}

/// Raw string storage.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// SQLite-backed store: one `kv` table of key/value text pairs.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`, creating parent dirs.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|_| StoreError::DirectoryCreation)?;
        }

        let conn = Connection::open(path)?;
        Self::initialize_tables(&conn)?;
        tracing::debug!(path = %path.display(), "opened store");

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing).
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_tables(&conn)?;
        Ok(Self { conn })
    }

    fn initialize_tables(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    /// Default database location in the platform data directory.
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("com", "tomato", "Tomato")
            .map(|dirs| dirs.data_dir().join("tomato.db"))
            .unwrap_or_else(|| PathBuf::from("tomato.db"))
    }
}

impl KeyValueStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemoryStore;


/// Typed access to a [`KeyValueStore`].
pub struct Repository {
    backend: Box<dyn KeyValueStore>,
}

impl Repository {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Reads and decodes the value under `key`.
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.backend.read(key)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|source| StoreError::Malformed {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Reads the value under `key`, or `T::default()` when it is absent,
    /// malformed or unreadable.
    pub fn get<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.try_get(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "falling back to defaults");
                T::default()
            }
        }
    }

    /// Encodes and writes `value` under `key`. Failures are logged and
    /// reported as `false`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(StoreError::from)
            .and_then(|json| self.backend.write(key, &json));

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "write failed, keeping in-memory state");
                false
            }
        }
    }

    /// Deletes every key the application writes.
    pub fn clear_all(&self) -> bool {
        let mut ok = true;
        for key in ALL_KEYS {
            if let Err(e) = self.backend.remove(key) {
                tracing::warn!(key, error = %e, "failed to clear key");
                ok = false;
            }
        }
        ok
    }
}
