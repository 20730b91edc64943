//! Handlers for `/settings` endpoints.

use axum::{Json, extract::State};
use cadence_core::persist::SnapshotStore;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize, Deserialize)]
pub struct LeadGoal {
  pub lead_goal: u32,
}

/// `GET /settings/lead-goal`
pub async fn lead_goal<P, I>(
  State(state): State<AppState<P, I>>,
) -> Result<Json<LeadGoal>, ApiError>
where
  P: SnapshotStore + 'static,
{
  let lead_goal = state.with_book(|book| Ok(book.lead_goal())).await?;
  Ok(Json(LeadGoal { lead_goal }))
}

/// `PUT /settings/lead-goal`. Body: `{"lead_goal":12}`
pub async fn set_lead_goal<P, I>(
  State(state): State<AppState<P, I>>,
  Json(body): Json<LeadGoal>,
) -> Result<Json<LeadGoal>, ApiError>
where
  P: SnapshotStore + 'static,
{
  let goal = body.lead_goal;
  state.with_book(move |book| book.set_lead_goal(goal)).await?;
  Ok(Json(body))
}
