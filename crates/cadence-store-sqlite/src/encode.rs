//! Encoding and decoding helpers between domain types and the plain-text
//! columns stored in SQLite.
//!
//! Timestamps are stored as RFC 3339 strings; keys as their snake_case name.

use cadence_core::persist::SnapshotKey;
use chrono::{DateTime, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── SnapshotKey ─────────────────────────────────────────────────────────────

pub fn encode_key(key: SnapshotKey) -> &'static str { key.as_str() }

pub fn decode_key(s: &str) -> Result<SnapshotKey> {
  s.parse().map_err(|_| Error::UnknownKey(s.to_owned()))
}

/// Raw strings read from a `snapshots` row, without the value.
pub struct RawEntry {
  pub key:        String,
  pub updated_at: String,
}

impl RawEntry {
  pub fn decode(self) -> Result<(SnapshotKey, DateTime<Utc>)> {
    Ok((decode_key(&self.key)?, decode_dt(&self.updated_at)?))
  }
}
