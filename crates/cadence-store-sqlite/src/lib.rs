//! SQLite backend for Cadence snapshots.
//!
//! Implements [`cadence_core::persist::SnapshotStore`] over a single
//! key-value table. The connection is guarded by a mutex so one store can be
//! shared between threads.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteSnapshots;
