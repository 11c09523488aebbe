//! Persistent store trait and its backends.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::error::StoreError;

/// Key/value store of opaque serialized records.
///
/// There is no locking across calls: a read followed by a write is not a
/// transaction, and concurrent writers of the same key race with last write
/// winning.
#[async_trait]
pub trait PersistentStore: Send + Sync {
  /// Read the bytes stored under `key`.
  async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

  /// Store `bytes` under `key`, replacing any previous value.
  async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

  /// Remove the value under `key`. Removing a missing key is not an error.
  async fn remove(&self, key: &str) -> Result<(), StoreError>;

  /// Remove several keys at once.
  async fn remove_all(&self, keys: &[String]) -> Result<(), StoreError> {
    for key in keys {
      self.remove(key).await?;
    }
    Ok(())
  }
}

/// Store that doesn't keep anything.
/// Used when caching is disabled - every read is a miss.
pub struct NoopStore;

#[async_trait]
impl PersistentStore for NoopStore {
  async fn read(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
    Ok(None) // Always miss
  }

  async fn write(&self, _key: &str, _bytes: &[u8]) -> Result<(), StoreError> {
    Ok(()) // Discard
  }

  async fn remove(&self, _key: &str) -> Result<(), StoreError> {
    Ok(())
  }
}

/// Process-lifetime store backed by a map.
#[derive(Default)]
pub struct MemoryStore {
  records: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn records(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, StoreError> {
    self.records.lock().map_err(|_| StoreError::LockPoisoned)
  }
}

#[async_trait]
impl PersistentStore for MemoryStore {
  async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
    Ok(self.records()?.get(key).cloned())
  }

  async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
    self.records()?.insert(key.to_string(), bytes.to_vec());
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), StoreError> {
    self.records()?.remove(key);
    Ok(())
  }

  async fn remove_all(&self, keys: &[String]) -> Result<(), StoreError> {
    let mut records = self.records()?;
    for key in keys {
      records.remove(key);
    }
    Ok(())
  }
}

/// SQLite-backed store, durable across restarts.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

/// Schema for the record table.
const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    written_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SqliteStore {
  /// Open or create the store at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// Run database migrations for the record table.
  fn run_migrations(&self) -> Result<()> {
    self
      .conn()?
      .execute_batch(STORE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
    self.conn.lock().map_err(|_| StoreError::LockPoisoned)
  }
}

#[async_trait]
impl PersistentStore for SqliteStore {
  async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
    let conn = self.conn()?;
    let data = conn
      .query_row(
        "SELECT data FROM kv_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(data)
  }

  async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
    self.conn()?.execute(
      "INSERT OR REPLACE INTO kv_store (key, data, written_at)
       VALUES (?, ?, datetime('now'))",
      params![key, bytes],
    )?;
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), StoreError> {
    self
      .conn()?
      .execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
    Ok(())
  }

  async fn remove_all(&self, keys: &[String]) -> Result<(), StoreError> {
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    for key in keys {
      tx.execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
    }
    tx.commit()?;
    Ok(())
  }
}
