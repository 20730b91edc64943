//! Handlers for `/contacts` endpoints and `/stats`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/contacts` | Optional `?day=Monday&stage=First%20Email` |
//! | `POST`   | `/contacts` | Body: [`NewContact`]; 201 |
//! | `GET`    | `/contacts/{id}` | 404 if not found |
//! | `PUT`    | `/contacts/{id}` | Body: [`Contact`]; sequence state is kept |
//! | `DELETE` | `/contacts/{id}` | 204; unknown ids are a no-op |
//! | `POST`   | `/contacts/delete` | Body: `{"ids":[..]}`; 204 |
//! | `POST`   | `/contacts/import` | Body: `{"day":"Monday","csv":".."}` |
//! | `POST`   | `/contacts/{id}/advance` | 409 once the sequence is done |
//! | `POST`   | `/contacts/{id}/insights` | 400 without social links, 502 on fetch failure |
//! | `GET`    | `/stats` | Contact count per stage |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cadence_core::{
  book::ImportResult,
  contact::{Contact, NewContact},
  insights::InsightSource,
  persist::SnapshotStore,
  stage::{Stage, WeekDay},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub day:   Option<WeekDay>,
  pub stage: Option<Stage>,
}

/// `GET /contacts[?day=<day>][&stage=<stage>]`
pub async fn list<P, I>(
  State(state): State<AppState<P, I>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Contact>>, ApiError>
where
  P: SnapshotStore + 'static,
{
  let contacts = state
    .with_book(move |book| {
      Ok(match (params.day, params.stage) {
        (Some(day), Some(stage)) => {
          book.filter(day, stage).into_iter().cloned().collect::<Vec<_>>()
        }
        (day, stage) => book
          .contacts()
          .iter()
          .filter(|c| day.is_none_or(|d| c.day == d))
          .filter(|c| stage.is_none_or(|s| c.stage == s))
          .cloned()
          .collect(),
      })
    })
    .await?;
  Ok(Json(contacts))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /contacts`
pub async fn create<P, I>(
  State(state): State<AppState<P, I>>,
  Json(body): Json<NewContact>,
) -> Result<impl IntoResponse, ApiError>
where
  P: SnapshotStore + 'static,
{
  let contact = state.with_book(move |book| book.add(body)).await?;
  Ok((StatusCode::CREATED, Json(contact)))
}

// ─── Single contact ───────────────────────────────────────────────────────────

/// `GET /contacts/{id}`
pub async fn get_one<P, I>(
  State(state): State<AppState<P, I>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError>
where
  P: SnapshotStore + 'static,
{
  let contact = state
    .with_book(move |book| Ok(book.get(id).cloned()))
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;
  Ok(Json(contact))
}

/// `PUT /contacts/{id}`. The path id wins over any id in the body.
pub async fn update<P, I>(
  State(state): State<AppState<P, I>>,
  Path(id): Path<Uuid>,
  Json(mut body): Json<Contact>,
) -> Result<Json<Contact>, ApiError>
where
  P: SnapshotStore + 'static,
{
  body.id = id;
  Ok(Json(state.with_book(move |book| book.update(body)).await?))
}

/// `DELETE /contacts/{id}`. Deleting an unknown id is a no-op.
pub async fn delete_one<P, I>(
  State(state): State<AppState<P, I>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  P: SnapshotStore + 'static,
{
  state.with_book(move |book| book.delete(id)).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Bulk ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteManyBody {
  pub ids: Vec<Uuid>,
}

/// `POST /contacts/delete`. Unknown ids are ignored.
pub async fn delete_many<P, I>(
  State(state): State<AppState<P, I>>,
  Json(body): Json<DeleteManyBody>,
) -> Result<StatusCode, ApiError>
where
  P: SnapshotStore + 'static,
{
  state.with_book(move |book| book.delete_many(&body.ids)).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ImportBody {
  pub day: WeekDay,
  pub csv: String,
}

/// `POST /contacts/import`. Rows missing required fields are reported in
/// `failures` rather than failing the request.
pub async fn import<P, I>(
  State(state): State<AppState<P, I>>,
  Json(body): Json<ImportBody>,
) -> Result<Json<ImportResult>, ApiError>
where
  P: SnapshotStore + 'static,
{
  let rows = cadence_import::parse_contacts(&body.csv, body.day)?;
  Ok(Json(state.with_book(move |book| book.import_batch(rows)).await?))
}

// ─── Sequence ─────────────────────────────────────────────────────────────────

/// `POST /contacts/{id}/advance`
pub async fn advance<P, I>(
  State(state): State<AppState<P, I>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError>
where
  P: SnapshotStore + 'static,
{
  let contact = state
    .with_book(move |book| {
      let today = book.now();
      book.advance_stage(id, today)
    })
    .await?;
  Ok(Json(contact))
}

/// `GET /stats`
pub async fn stats<P, I>(
  State(state): State<AppState<P, I>>,
) -> Result<Json<BTreeMap<Stage, usize>>, ApiError>
where
  P: SnapshotStore + 'static,
{
  Ok(Json(state.with_book(|book| Ok(book.stats())).await?))
}

// ─── Insights ─────────────────────────────────────────────────────────────────

/// `POST /contacts/{id}/insights`
pub async fn insights<P, I>(
  State(state): State<AppState<P, I>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError>
where
  P: SnapshotStore + 'static,
  I: InsightSource,
{
  let urls = state.with_book(move |book| book.insight_request(id)).await?;
  let outcome = state
    .insights
    .fetch_insights(&urls)
    .await
    .map_err(|e| e.to_string());
  let contact = state
    .with_book(move |book| book.apply_insights(id, outcome))
    .await?;
  Ok(Json(contact))
}
