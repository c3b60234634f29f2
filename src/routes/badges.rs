//! Badge catalog handlers. Thin wrappers over `AppState`; errors surface as `ApiError`.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use tracing::{info, instrument};

use crate::domain::Badge;
use crate::error::ApiResult;
use crate::protocol::{BadgeIn, BadgePatch, BadgeQuery, MessageOut};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_list_badges(
  State(state): State<Arc<AppState>>,
  Query(q): Query<BadgeQuery>,
) -> Json<Vec<Badge>> {
  Json(state.list_badges(&q).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_badge(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<Json<Badge>> {
  Ok(Json(state.get_badge(&id).await?))
}

#[instrument(level = "info", skip(state, body), fields(name = %body.name))]
pub async fn http_create_badge(
  State(state): State<Arc<AppState>>,
  Json(body): Json<BadgeIn>,
) -> ApiResult<(StatusCode, Json<Badge>)> {
  let badge = state.create_badge(body).await?;
  Ok((StatusCode::CREATED, Json(badge)))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_update_badge(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<BadgePatch>,
) -> ApiResult<Json<Badge>> {
  Ok(Json(state.update_badge(&id, body).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_badge(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<Json<MessageOut>> {
  state.deactivate_badge(&id).await?;
  Ok(Json(MessageOut { message: "Badge deactivated".into() }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_badges_by_category(
  State(state): State<Arc<AppState>>,
  Path(category_name): Path<String>,
) -> Json<Vec<Badge>> {
  let list: Vec<Badge> = state
    .active_badges()
    .await
    .into_iter()
    .filter(|b| b.category.as_str() == category_name)
    .collect();
  info!(target: "badges", %category_name, count = list.len(), "Badges by category");
  Json(list)
}

#[instrument(level = "info", skip(state))]
pub async fn http_badges_by_rarity(
  State(state): State<Arc<AppState>>,
  Path(rarity_level): Path<String>,
) -> Json<Vec<Badge>> {
  let list: Vec<Badge> = state
    .active_badges()
    .await
    .into_iter()
    .filter(|b| b.rarity.as_str() == rarity_level)
    .collect();
  info!(target: "badges", %rarity_level, count = list.len(), "Badges by rarity");
  Json(list)
}
