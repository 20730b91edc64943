//! Social-profile insights for Cadence contacts.
//!
//! [`ChatInsights`] asks an OpenAI-compatible chat-completions endpoint to
//! summarise a prospect's public LinkedIn/Facebook presence and parses the
//! reply into a [`cadence_core::contact::SocialProfile`]. Transient failures
//! (rate limits, timeouts, 5xx) are retried with exponential backoff inside
//! the client; callers see a single success or failure.

mod client;
pub mod error;
mod prompt;

pub use client::ChatInsights;
pub use error::{Error, FailureKind, ProviderFailure, Result};
use serde::Deserialize;

/// Connection and retry settings for [`ChatInsights`].
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
  /// Base URL up to but excluding `/chat/completions`.
  pub base_url:     String,
  pub api_key:      String,
  pub model:        String,
  /// Extra attempts after the first for retryable failures.
  pub max_retries:  u32,
  pub timeout_secs: u64,
  /// First retry delay; doubles per attempt.
  pub backoff_ms:   u64,
}

impl Default for InsightsConfig {
  fn default() -> Self {
    Self {
      base_url:     "https://api.openai.com/v1".into(),
      api_key:      String::new(),
      model:        "gpt-3.5-turbo".into(),
      max_retries:  3,
      timeout_secs: 60,
      backoff_ms:   500,
    }
  }
}

impl std::fmt::Debug for InsightsConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("InsightsConfig")
      .field("base_url", &self.base_url)
      .field("api_key", &"<redacted>")
      .field("model", &self.model)
      .field("max_retries", &self.max_retries)
      .field("timeout_secs", &self.timeout_secs)
      .field("backoff_ms", &self.backoff_ms)
      .finish()
  }
}
