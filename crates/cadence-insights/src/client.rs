//! [`ChatInsights`]: an [`InsightSource`] backed by an OpenAI-compatible
//! chat-completions endpoint.

use std::{future::Future, time::Duration};

use cadence_core::{contact::SocialProfile, insights::InsightSource, insights::SocialUrls};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{Error, InsightsConfig, ProviderFailure, Result, prompt};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ChatInsights {
  client:   Client,
  base_url: String,
  config:   InsightsConfig,
}

impl std::fmt::Debug for ChatInsights {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ChatInsights")
      .field("base_url", &self.base_url)
      .field("model", &self.config.model)
      .finish_non_exhaustive()
  }
}

impl ChatInsights {
  pub fn new(config: InsightsConfig) -> Result<Self> {
    validate_base_url(&config.base_url)?;
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(Error::Client)?;
    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_owned(),
      config,
    })
  }

  /// Fetch insights for `urls`, retrying transient failures up to
  /// `max_retries` times.
  pub async fn fetch(&self, urls: &SocialUrls) -> Result<SocialProfile> {
    let body = prompt::request_body(&self.config.model, urls);
    let mut attempt = 0;
    loop {
      match self.complete(&body).await {
        Ok(content) => return prompt::parse_profile(&content),
        Err(Error::Provider(failure))
          if failure.is_retryable() && attempt < self.config.max_retries =>
        {
          let delay = backoff(self.config.backoff_ms, attempt, failure.retry_after_secs);
          warn!(%failure, attempt, ?delay, "insight request failed; retrying");
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(e) => return Err(e),
      }
    }
  }

  async fn complete(&self, body: &Value) -> Result<String> {
    let url = format!("{}/chat/completions", self.base_url);
    info!(model = %self.config.model, url = %url, "requesting insights");

    let resp = self
      .client
      .post(&url)
      .bearer_auth(&self.config.api_key)
      .json(body)
      .send()
      .await
      .map_err(|e| Error::Provider(ProviderFailure::network(&e)))?;

    let status = resp.status();
    let text = resp
      .text()
      .await
      .map_err(|e| Error::Provider(ProviderFailure::network(&e)))?;

    if !status.is_success() {
      return Err(Error::Provider(ProviderFailure::from_status(status.as_u16(), &text)));
    }
    debug!(bytes = text.len(), "insight response received");
    prompt::completion_content(&text)
  }
}

impl InsightSource for ChatInsights {
  type Error = Error;

  fn fetch_insights<'a>(
    &'a self,
    urls: &'a SocialUrls,
  ) -> impl Future<Output = Result<SocialProfile>> + Send + 'a {
    self.fetch(urls)
  }
}

/// Delay before retry number `attempt` (0-based): the provider's
/// `retry_after` when given, otherwise `base_ms * 2^attempt`, capped.
pub(crate) fn backoff(base_ms: u64, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
  let delay = match retry_after_secs {
    Some(secs) => Duration::from_secs(secs),
    None => Duration::from_millis(base_ms.saturating_mul(1 << attempt.min(16))),
  };
  delay.min(MAX_BACKOFF)
}

/// HTTPS anywhere; plain HTTP only for loopback hosts.
fn validate_base_url(base_url: &str) -> Result<()> {
  let invalid = |reason: String| Error::BaseUrl { url: base_url.to_owned(), reason };
  let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
  let host = parsed.host_str().unwrap_or("");

  match parsed.scheme() {
    "https" => Ok(()),
    "http" if matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1") => {
      warn!(base_url, "API key will be sent over plain HTTP");
      Ok(())
    }
    "http" => Err(invalid("plain HTTP is only allowed for localhost".into())),
    other => Err(invalid(format!("unsupported scheme {other:?}"))),
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  };

  use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
  use serde_json::json;

  use super::*;

  // ── Pure helpers ──────────────────────────────────────────────────────────

  #[test]
  fn backoff_doubles_and_caps() {
    assert_eq!(backoff(500, 0, None), Duration::from_millis(500));
    assert_eq!(backoff(500, 1, None), Duration::from_millis(1000));
    assert_eq!(backoff(500, 3, None), Duration::from_millis(4000));
    assert_eq!(backoff(500, 40, None), MAX_BACKOFF);
  }

  #[test]
  fn backoff_prefers_retry_after() {
    assert_eq!(backoff(500, 0, Some(3)), Duration::from_secs(3));
    assert_eq!(backoff(500, 0, Some(600)), MAX_BACKOFF);
  }

  #[test]
  fn base_url_rules() {
    assert!(validate_base_url("https://api.example.com/v1").is_ok());
    assert!(validate_base_url("http://localhost:8080/v1").is_ok());
    assert!(validate_base_url("http://127.0.0.1:1234").is_ok());
    assert!(validate_base_url("http://api.example.com/v1").is_err());
    assert!(validate_base_url("ftp://example.com").is_err());
    assert!(validate_base_url("not a url").is_err());
  }

  #[test]
  fn trailing_slash_is_trimmed() {
    let c = ChatInsights::new(InsightsConfig {
      base_url: "https://api.example.com/v1/".into(),
      ..InsightsConfig::default()
    })
    .unwrap();
    assert_eq!(c.base_url, "https://api.example.com/v1");
  }

  // ── Against a local endpoint ──────────────────────────────────────────────

  /// Fails with `fail_status` for the first `failures` calls, then answers.
  async fn serve(failures: usize, fail_status: StatusCode) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = move |State(calls): State<Arc<AtomicUsize>>| async move {
      let n = calls.fetch_add(1, Ordering::SeqCst);
      if n < failures {
        return (fail_status, Json(json!({ "error": { "message": "busy" } })));
      }
      let content = json!({ "company_info": { "founded": "1949" } }).to_string();
      (
        StatusCode::OK,
        Json(json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })),
      )
    };
    let app = Router::new()
      .route("/v1/chat/completions", post(handler))
      .with_state(calls.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (format!("http://{addr}/v1"), calls)
  }

  fn client(base_url: String, max_retries: u32) -> ChatInsights {
    ChatInsights::new(InsightsConfig {
      base_url,
      api_key: "test-key".into(),
      max_retries,
      backoff_ms: 1,
      ..InsightsConfig::default()
    })
    .unwrap()
  }

  fn urls() -> SocialUrls {
    SocialUrls { linkedin: Some("https://linkedin.com/in/wile".into()), facebook: None }
  }

  #[tokio::test]
  async fn transient_failures_are_retried() {
    let (base, calls) = serve(2, StatusCode::SERVICE_UNAVAILABLE).await;
    let profile = client(base, 3).fetch_insights(&urls()).await.unwrap();
    assert_eq!(profile.company_info.unwrap().founded, "1949");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn retries_are_bounded() {
    let (base, calls) = serve(10, StatusCode::BAD_GATEWAY).await;
    let err = client(base, 2).fetch(&urls()).await.unwrap_err();
    assert!(matches!(
      err,
      Error::Provider(ProviderFailure { status: Some(502), .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn auth_failures_are_not_retried() {
    let (base, calls) = serve(10, StatusCode::UNAUTHORIZED).await;
    let err = client(base, 5).fetch(&urls()).await.unwrap_err();
    assert!(matches!(
      err,
      Error::Provider(ProviderFailure { kind: crate::FailureKind::Auth, .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
