//! The persistence boundary: a key-value store of whole-snapshot JSON values.
//!
//! The book reads every key once when it opens and rewrites a key whenever the
//! value behind it changes. Backends (e.g. `cadence-store-sqlite`) implement
//! [`SnapshotStore`]; [`MemorySnapshots`] is an in-process implementation for
//! tests and ephemeral use.

use std::{collections::HashMap, convert::Infallible, sync::Mutex};

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The snapshots the book persists.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum SnapshotKey {
  /// JSON array of [`crate::contact::Contact`].
  Contacts,
  /// JSON array of [`crate::event::CalendarEvent`].
  CalendarEvents,
  /// JSON integer.
  LeadGoal,
}

impl SnapshotKey {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// Abstraction over a snapshot backend.
pub trait SnapshotStore: Send {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The stored value for `key`, or `None` if never written.
  fn read(&self, key: SnapshotKey) -> Result<Option<String>, Self::Error>;

  /// Replace the stored value for `key`.
  fn write(&self, key: SnapshotKey, value: &str) -> Result<(), Self::Error>;
}

// ─── In-memory backend ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemorySnapshots {
  values: Mutex<HashMap<SnapshotKey, String>>,
}

impl MemorySnapshots {
  pub fn new() -> Self { Self::default() }

  /// A copy of the raw stored value, for asserting on what was
  /// persisted.
  pub fn get(&self, key: SnapshotKey) -> Option<String> {
    self
      .values
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .get(&key)
      .cloned()
  }
}

impl SnapshotStore for MemorySnapshots {
  type Error = Infallible;

  fn read(&self, key: SnapshotKey) -> Result<Option<String>, Self::Error> {
    Ok(self.get(key))
  }

  fn write(&self, key: SnapshotKey, value: &str) -> Result<(), Self::Error> {
    self
      .values
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .insert(key, value.to_owned());
    Ok(())
  }
}

impl<S: SnapshotStore + Sync> SnapshotStore for std::sync::Arc<S> {
  type Error = S::Error;

  fn read(&self, key: SnapshotKey) -> Result<Option<String>, Self::Error> {
    (**self).read(key)
  }

  fn write(&self, key: SnapshotKey, value: &str) -> Result<(), Self::Error> {
    (**self).write(key, value)
  }
}
