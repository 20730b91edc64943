//! Error types for `cadence-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// One or more required contact fields were empty. The contact was not
  /// created.
  #[error("missing required fields: {}", .missing.join(", "))]
  Validation { missing: Vec<&'static str> },

  #[error("contact not found: {0}")]
  ContactNotFound(Uuid),

  /// Advance was requested on a contact that already finished its sequence.
  /// Benign; no state was changed.
  #[error("contact {0} has already completed its sequence")]
  AlreadyCompleted(Uuid),

  #[error("contact {0} has no social profile links")]
  NoSocialProfiles(Uuid),

  /// The insight collaborator failed; carries its original message.
  #[error("insight fetch failed: {0}")]
  ExternalFetch(String),

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a snapshot-store failure.
  pub fn persistence<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
