//! Key-value settings storage.
//!
//! The sampler persists through [`SettingsStore`]. [`SqliteStore`] is the
//! on-disk backend; [`MemoryStore`] keeps everything in a shared map and is
//! used for tests and dry runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};

const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Errors that can occur during settings storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Process-wide key-value storage holding byte blobs and numbers.
pub trait SettingsStore: Send {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()>;

    /// Read a numeric value. A key holding bytes reads as `None`.
    fn get_number(&self, key: &str) -> Result<Option<f64>>;

    fn set_number(&mut self, key: &str, value: f64) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<T: SettingsStore + ?Sized> SettingsStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        (**self).set(key, value)
    }

    fn get_number(&self, key: &str) -> Result<Option<f64>> {
        (**self).get_number(key)
    }

    fn set_number(&mut self, key: &str, value: f64) -> Result<()> {
        (**self).set_number(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Bytes(Vec<u8>),
    Number(f64),
}

/// In-memory store. Clones share the same map, so a clone handed to a second
/// sampler sees everything the first one wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<String, Entry>) -> R) -> R {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut entries)
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.with_entries(|entries| match entries.get(key) {
            Some(Entry::Bytes(bytes)) => Some(bytes.clone()),
            _ => None,
        }))
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), Entry::Bytes(value.to_vec()));
        });
        Ok(())
    }

    fn get_number(&self, key: &str) -> Result<Option<f64>> {
        Ok(self.with_entries(|entries| match entries.get(key) {
            Some(Entry::Number(n)) => Some(*n),
            _ => None,
        }))
    }

    fn set_number(&mut self, key: &str, value: f64) -> Result<()> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), Entry::Number(value));
        });
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.with_entries(|entries| {
            entries.remove(key);
        });
        Ok(())
    }
}

/// Settings storage backed by SQLite.
///
/// One `settings` table keyed by name. Byte values are stored as BLOBs and
/// numbers as REALs, relying on SQLite's per-value typing.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Open or create the settings database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;",
        )?;

        let mut store = Self { conn, path };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the database file size in bytes
    pub fn size_bytes(&self) -> Result<u64> {
        if self.path.to_string_lossy() == ":memory:" {
            return Ok(0);
        }
        Ok(std::fs::metadata(&self.path)?.len())
    }

    fn initialize_schema(&mut self) -> Result<()> {
        if self.get_schema_version()? == 0 {
            let tx = self.conn.transaction()?;
            tx.execute_batch(
                r#"
                CREATE TABLE schema_version (
                    version INTEGER NOT NULL
                );

                CREATE TABLE settings (
                    key TEXT PRIMARY KEY,
                    value NOT NULL
                );
                "#,
            )?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?)",
                [CURRENT_SCHEMA_VERSION],
            )?;
            tx.commit()?;
        }
        Ok(())
    }

    /// Get the current schema version (0 if not initialized)
    fn get_schema_version(&self) -> Result<i32> {
        let exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )?;

        if !exists {
            return Ok(0);
        }

        let version: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        Ok(version)
    }

    fn get_value(&self, key: &str) -> Result<Option<Value>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| {
                row.get::<_, Value>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put_value(&self, key: &str, value: Value) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SettingsStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(match self.get_value(key)? {
            Some(Value::Blob(bytes)) => Some(bytes),
            _ => None,
        })
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.put_value(key, Value::Blob(value.to_vec()))
    }

    fn get_number(&self, key: &str) -> Result<Option<f64>> {
        Ok(match self.get_value(key)? {
            Some(Value::Real(n)) => Some(n),
            Some(Value::Integer(n)) => Some(n as f64),
            _ => None,
        })
    }

    fn set_number(&mut self, key: &str, value: f64) -> Result<()> {
        self.put_value(key, Value::Real(value))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM settings WHERE key = ?", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &mut dyn SettingsStore) {
        assert_eq!(store.get("missing").unwrap(), None);
        assert_eq!(store.get_number("missing").unwrap(), None);

        store.set("blob", b"hello").unwrap();
        assert_eq!(store.get("blob").unwrap(), Some(b"hello".to_vec()));
        assert_eq!(store.get_number("blob").unwrap(), None);

        store.set_number("num", 300.0).unwrap();
        assert_eq!(store.get_number("num").unwrap(), Some(300.0));
        assert_eq!(store.get("num").unwrap(), None);

        store.set("blob", b"replaced").unwrap();
        assert_eq!(store.get("blob").unwrap(), Some(b"replaced".to_vec()));

        store.remove("blob").unwrap();
        assert_eq!(store.get("blob").unwrap(), None);
    }

    #[test]
    fn test_memory_store_contract() {
        exercise(&mut MemoryStore::new());
    }

    #[test]
    fn test_sqlite_store_contract() {
        exercise(&mut SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let mut a = MemoryStore::new();
        let b = a.clone();
        a.set_number("logInterval", 120.0).unwrap();
        assert_eq!(b.get_number("logInterval").unwrap(), Some(120.0));
    }

    #[test]
    fn test_sqlite_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set("batteryHistory", b"[]").unwrap();
            store.set_number("logInterval", 900.0).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("batteryHistory").unwrap(), Some(b"[]".to_vec()));
        assert_eq!(store.get_number("logInterval").unwrap(), Some(900.0));
        assert!(store.size_bytes().unwrap() > 0);
    }
}
