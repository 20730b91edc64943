//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("{0}")]
  Unprocessable(String),

  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  BadGateway(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<cadence_core::Error> for ApiError {
  fn from(err: cadence_core::Error) -> Self {
    use cadence_core::Error as E;
    match err {
      E::Validation { .. } => ApiError::Unprocessable(err.to_string()),
      E::ContactNotFound(id) => ApiError::NotFound(format!("contact {id} not found")),
      E::AlreadyCompleted(_) => ApiError::Conflict(err.to_string()),
      E::NoSocialProfiles(_) => ApiError::BadRequest(err.to_string()),
      E::ExternalFetch(_) => ApiError::BadGateway(err.to_string()),
      E::Persistence(_) | E::Serialization(_) => ApiError::Store(Box::new(err)),
    }
  }
}

impl From<cadence_import::Error> for ApiError {
  fn from(err: cadence_import::Error) -> Self { ApiError::BadRequest(err.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::BadGateway(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
