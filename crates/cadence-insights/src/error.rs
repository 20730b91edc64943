//! Error types for the insight client.

use std::fmt;

use strum::Display;
use thiserror::Error;

/// Why a completion request failed, as far as recovery is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FailureKind {
  /// 401/403: bad key or permissions.
  Auth,
  /// 402: quota exhausted.
  Billing,
  /// 429: check `retry_after_secs`.
  RateLimit,
  /// 404: usually a bad model name.
  NotFound,
  /// 408 or a client-side timeout.
  Timeout,
  /// Connection refused, DNS failure, reset.
  Network,
  /// 500/502/503/504.
  ServerError,
  Unknown,
}

/// A classified failure talking to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
  pub kind:             FailureKind,
  pub status:           Option<u16>,
  pub message:          String,
  /// Seconds the provider asked us to wait (429 bodies only).
  pub retry_after_secs: Option<u64>,
}

impl ProviderFailure {
  pub fn from_status(status: u16, body: &str) -> Self {
    let kind = match status {
      401 | 403 => FailureKind::Auth,
      402 => FailureKind::Billing,
      404 => FailureKind::NotFound,
      408 => FailureKind::Timeout,
      429 => FailureKind::RateLimit,
      500 | 502 | 503 | 504 => FailureKind::ServerError,
      _ => FailureKind::Unknown,
    };
    let retry_after_secs = match kind {
      FailureKind::RateLimit => extract_retry_after(body),
      _ => None,
    };
    Self { kind, status: Some(status), message: truncate(body), retry_after_secs }
  }

  pub fn network(err: &reqwest::Error) -> Self {
    let kind = if err.is_timeout() { FailureKind::Timeout } else { FailureKind::Network };
    Self { kind, status: None, message: err.to_string(), retry_after_secs: None }
  }

  /// Whether the same request is worth sending again.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self.kind,
      FailureKind::RateLimit
        | FailureKind::Timeout
        | FailureKind::Network
        | FailureKind::ServerError
    )
  }
}

impl fmt::Display for ProviderFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.status {
      Some(status) => write!(f, "{} ({status}): {}", self.kind, self.message),
      None => write!(f, "{}: {}", self.kind, self.message),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid base URL {url:?}: {reason}")]
  BaseUrl { url: String, reason: String },

  #[error("failed to build HTTP client")]
  Client(#[source] reqwest::Error),

  #[error("insight provider error: {0}")]
  Provider(ProviderFailure),

  #[error("unusable completion: {0}")]
  Completion(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// `{"error": {"retry_after": 5}}` or `{"retry_after": 5}`, integer or float.
pub(crate) fn extract_retry_after(body: &str) -> Option<u64> {
  let v: serde_json::Value = serde_json::from_str(body).ok()?;
  let field = if v["error"]["retry_after"].is_null() {
    &v["retry_after"]
  } else {
    &v["error"]["retry_after"]
  };
  field
    .as_u64()
    .or_else(|| field.as_f64().map(|f| f.ceil() as u64))
}

fn truncate(body: &str) -> String {
  const MAX: usize = 300;
  if body.len() <= MAX {
    return body.to_owned();
  }
  let mut end = MAX;
  while !body.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}...", &body[..end])
}
