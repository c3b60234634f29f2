//! User progress, earned badges and award triggers.
//! Each handler is instrumented and logs the award result.

use std::sync::Arc;
use axum::{body::Bytes, extract::{Path, State}, http::StatusCode, Json};
use serde_json::json;
use tracing::{info, instrument};

use crate::domain::{Badge, User};
use crate::error::ApiResult;
use crate::protocol::{AwardIn, CheckIn, EarnedBadgeOut, MessageOut, ProgressPatch, UserIn};
use crate::state::{AppState, AwardOutcome};
use super::optional_json;

#[instrument(level = "info", skip(state, body), fields(name = %body.name))]
pub async fn http_create_user(
  State(state): State<Arc<AppState>>,
  Json(body): Json<UserIn>,
) -> ApiResult<(StatusCode, Json<User>)> {
  let user = state.create_user(body).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_user(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
) -> ApiResult<Json<User>> {
  Ok(Json(state.get_user(&user_id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_update_progress(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
  Json(body): Json<ProgressPatch>,
) -> ApiResult<Json<User>> {
  Ok(Json(state.update_progress(&user_id, &body).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_earned_badges(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<EarnedBadgeOut>>> {
  Ok(Json(state.earned_badges(&user_id).await?))
}

/// Manual award. The body is optional; without `criteriaMet` the record says "manual award".
/// A body that is present but not valid JSON is rejected before anything is awarded.
#[instrument(level = "info", skip(state, body))]
pub async fn http_award_badge(
  State(state): State<Arc<AppState>>,
  Path((user_id, badge_id)): Path<(String, String)>,
  body: Bytes,
) -> ApiResult<Json<MessageOut>> {
  let award: AwardIn = optional_json(&body)?;
  let criteria_met = award.criteria_met.unwrap_or_else(|| json!("manual award"));
  let outcome = state.award_badge(&user_id, &badge_id, criteria_met).await?;
  match &outcome {
    AwardOutcome::Awarded { xp_reward } => info!(target: "badges", %user_id, %badge_id, xp_reward, "HTTP manual award granted"),
    AwardOutcome::AlreadyHeld => info!(target: "badges", %user_id, %badge_id, "HTTP manual award skipped: already held"),
  }
  Ok(Json(MessageOut { message: outcome.message().into() }))
}

/// Batch evaluation for an application event. Responds with the newly awarded badges only.
#[instrument(level = "info", skip(state, body))]
pub async fn http_check_badges(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
  body: Bytes,
) -> ApiResult<Json<Vec<Badge>>> {
  let check: CheckIn = optional_json(&body)?;
  let outcome = state.check_and_award(&user_id, &check.event, &check.event_data).await?;
  info!(target: "badges", %user_id, event = %check.event, awarded = outcome.awarded.len(), failed = outcome.failed.len(), "HTTP badge check");
  Ok(Json(outcome.awarded))
}
