//! [`SqliteSnapshots`]: the SQLite implementation of [`SnapshotStore`].

use std::{
  path::Path,
  sync::{Mutex, MutexGuard},
};

use cadence_core::persist::{SnapshotKey, SnapshotStore};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{RawEntry, encode_dt, encode_key},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Cadence snapshots backed by a single SQLite file.
pub struct SqliteSnapshots {
  conn: Mutex<Connection>,
}

impl SqliteSnapshots {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "opening snapshot store");
    Self::init(Connection::open(path)?)
  }

  /// Open an in-memory store, for tests.
  pub fn open_in_memory() -> Result<Self> {
    Self::init(Connection::open_in_memory()?)
  }

  fn init(conn: Connection) -> Result<Self> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn: Mutex::new(conn) })
  }

  fn conn(&self) -> MutexGuard<'_, Connection> {
    // A panic mid-statement leaves SQLite itself consistent.
    self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Every stored key with the time it was last written.
  pub fn entries(&self) -> Result<Vec<(SnapshotKey, DateTime<Utc>)>> {
    let conn = self.conn();
    let mut stmt =
      conn.prepare("SELECT key, updated_at FROM snapshots ORDER BY key")?;
    let raws = stmt
      .query_map([], |row| {
        Ok(RawEntry { key: row.get(0)?, updated_at: row.get(1)? })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    raws.into_iter().map(RawEntry::decode).collect()
  }
}

// ─── SnapshotStore impl ──────────────────────────────────────────────────────

impl SnapshotStore for SqliteSnapshots {
  type Error = crate::Error;

  fn read(&self, key: SnapshotKey) -> Result<Option<String>> {
    let value = self
      .conn()
      .query_row(
        "SELECT value FROM snapshots WHERE key = ?1",
        rusqlite::params![encode_key(key)],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  fn write(&self, key: SnapshotKey, value: &str) -> Result<()> {
    let at = encode_dt(Utc::now());
    self.conn().execute(
      "INSERT INTO snapshots (key, value, updated_at) VALUES (?1, ?2, ?3)
       ON CONFLICT(key) DO UPDATE SET
         value      = excluded.value,
         updated_at = excluded.updated_at",
      rusqlite::params![encode_key(key), value, at],
    )?;
    tracing::trace!(%key, bytes = value.len(), "wrote snapshot");
    Ok(())
  }
}
