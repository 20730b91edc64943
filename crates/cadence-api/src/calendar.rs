//! Handlers for `/calendar` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/calendar/day?date=2024-04-01` | Events on that day |
//! | `GET`  | `/calendar/month?year=2024&month=4` | Events within the month |
//! | `GET`  | `/calendar/due?date=2024-04-01` | Pending events due on or before the date |

use axum::{
  Json,
  extract::{Query, State},
};
use cadence_core::{date, event::CalendarEvent, persist::SnapshotStore};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct DateParams {
  pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct MonthParams {
  pub year:  i32,
  pub month: u32,
}

/// `GET /calendar/day?date=<date>`
pub async fn day<P, I>(
  State(state): State<AppState<P, I>>,
  Query(params): Query<DateParams>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError>
where
  P: SnapshotStore + 'static,
{
  let events = state
    .with_book(move |book| {
      Ok(book.events_on_day(params.date).into_iter().cloned().collect::<Vec<_>>())
    })
    .await?;
  Ok(Json(events))
}

/// `GET /calendar/month?year=<y>&month=<m>`
pub async fn month<P, I>(
  State(state): State<AppState<P, I>>,
  Query(params): Query<MonthParams>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError>
where
  P: SnapshotStore + 'static,
{
  let (start, end) = date::month_bounds(params.year, params.month).ok_or_else(|| {
    ApiError::BadRequest(format!("no such month: {}-{}", params.year, params.month))
  })?;
  let events = state
    .with_book(move |book| {
      Ok(book.events_in_month(start, end).into_iter().cloned().collect::<Vec<_>>())
    })
    .await?;
  Ok(Json(events))
}

/// `GET /calendar/due?date=<date>`
pub async fn due<P, I>(
  State(state): State<AppState<P, I>>,
  Query(params): Query<DateParams>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError>
where
  P: SnapshotStore + 'static,
{
  let events = state
    .with_book(move |book| {
      Ok(book.due_by(params.date).into_iter().cloned().collect::<Vec<_>>())
    })
    .await?;
  Ok(Json(events))
}
