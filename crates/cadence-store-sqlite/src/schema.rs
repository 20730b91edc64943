//! SQL schema for the Cadence SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per snapshot key; the value is replaced wholesale on every write.
CREATE TABLE IF NOT EXISTS snapshots (
    key         TEXT PRIMARY KEY,   -- 'contacts' | 'calendar_events' | 'lead_goal'
    value       TEXT NOT NULL,      -- JSON document
    updated_at  TEXT NOT NULL       -- ISO 8601 UTC
);

PRAGMA user_version = 1;
";
