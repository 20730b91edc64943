//! JSON REST API for Cadence.
//!
//! Exposes an axum [`Router`] over a shared [`ContactBook`] and an
//! [`InsightSource`]. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cadence_api::api_router(state))
//! ```

pub mod calendar;
pub mod contacts;
pub mod error;
pub mod settings;

use std::sync::{Arc, Mutex};

use axum::{
  Router,
  routing::{get, post},
};
use cadence_core::{book::ContactBook, insights::InsightSource, persist::SnapshotStore};

pub use error::ApiError;

/// Shared handler state.
///
/// The book is synchronous and its writes hit the snapshot store, so every
/// book call runs on the blocking pool via [`AppState::with_book`]. The lock
/// is never held across an `.await`.
pub struct AppState<P, I> {
  pub book:     Arc<Mutex<ContactBook<P>>>,
  pub insights: Arc<I>,
}

impl<P, I> AppState<P, I> {
  pub fn new(book: ContactBook<P>, insights: I) -> Self {
    Self { book: Arc::new(Mutex::new(book)), insights: Arc::new(insights) }
  }
}

impl<P, I> AppState<P, I>
where
  P: SnapshotStore + 'static,
{
  /// Run `f` against the locked book on tokio's blocking pool.
  ///
  /// A poisoned lock is recovered: a failed mutation has already rolled the
  /// book back.
  pub async fn with_book<T, F>(&self, f: F) -> Result<T, ApiError>
  where
    F: FnOnce(&mut ContactBook<P>) -> cadence_core::Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let book = self.book.clone();
    let outcome = tokio::task::spawn_blocking(move || {
      let mut guard = book.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
      f(&mut *guard)
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
    Ok(outcome?)
  }
}

impl<P, I> Clone for AppState<P, I> {
  fn clone(&self) -> Self {
    Self { book: self.book.clone(), insights: self.insights.clone() }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<P, I>(state: AppState<P, I>) -> Router<()>
where
  P: SnapshotStore + 'static,
  I: InsightSource + 'static,
{
  Router::new()
    // Contacts
    .route(
      "/contacts",
      get(contacts::list::<P, I>).post(contacts::create::<P, I>),
    )
    .route("/contacts/delete", post(contacts::delete_many::<P, I>))
    .route("/contacts/import", post(contacts::import::<P, I>))
    .route(
      "/contacts/{id}",
      get(contacts::get_one::<P, I>)
        .put(contacts::update::<P, I>)
        .delete(contacts::delete_one::<P, I>),
    )
    .route("/contacts/{id}/advance", post(contacts::advance::<P, I>))
    .route("/contacts/{id}/insights", post(contacts::insights::<P, I>))
    .route("/stats", get(contacts::stats::<P, I>))
    // Calendar
    .route("/calendar/day", get(calendar::day::<P, I>))
    .route("/calendar/month", get(calendar::month::<P, I>))
    .route("/calendar/due", get(calendar::due::<P, I>))
    // Settings
    .route(
      "/settings/lead-goal",
      get(settings::lead_goal::<P, I>).put(settings::set_lead_goal::<P, I>),
    )
    .with_state(state)
}
