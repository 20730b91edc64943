//! Error type for `cadence-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown snapshot key: {0:?}")]
  UnknownKey(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
