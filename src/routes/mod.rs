//! Router assembly: badge + user endpoints under `/api/v1`, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    body::Bytes,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{instrument, Level};

use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};
use crate::protocol::HealthOut;
use crate::state::AppState;

pub mod badges;
pub mod users;

/// Decode a body that may be omitted. Empty (or whitespace-only) means `T::default()`;
/// anything else must parse as `T` or the request fails with a validation error.
pub fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::validation(format!("invalid JSON body: {}", e)))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

/// Build the application router with:
/// - badge catalog CRUD and filters under `/api/v1/badges`
/// - user progress, earned badges and award triggers under `/api/v1/users`
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(http_health))
        // Catalog
        .route("/badges", get(badges::http_list_badges).post(badges::http_create_badge))
        .route(
            "/badges/:id",
            get(badges::http_get_badge)
                .put(badges::http_update_badge)
                .delete(badges::http_delete_badge),
        )
        .route("/badges/category/:category_name", get(badges::http_badges_by_category))
        .route("/badges/rarity/:rarity_level", get(badges::http_badges_by_rarity))
        // Users + awards
        .route("/users", post(users::http_create_user))
        .route("/users/:user_id", get(users::http_get_user))
        .route("/users/:user_id/progress", patch(users::http_update_progress))
        .route("/users/:user_id/badges", get(users::http_earned_badges))
        .route("/users/:user_id/badges/check", post(users::http_check_badges))
        .route("/users/:user_id/badges/:badge_id", post(users::http_award_badge));

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use crate::config::ServiceConfig;

    fn app() -> Router {
        let state = AppState::from_config(ServiceConfig { seed_builtin_badges: false, ..Default::default() });
        build_router(Arc::new(state))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, value)
    }

    fn badge_json(id: &str, kind: &str, threshold: f64, xp: u64, category: &str) -> Value {
        json!({
            "id": id,
            "name": id.to_uppercase(),
            "description": "test badge",
            "category": category,
            "rarity": "rare",
            "criteria": { "type": kind, "threshold": threshold },
            "xpReward": xp,
        })
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = send(&app(), "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn badge_crud_flow() {
        let app = app();
        let (status, created) = send(&app, "POST", "/api/v1/badges", Some(badge_json("a", "note_count", 1.0, 10, "achievement"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["isActive"], true);
        assert_eq!(created["criteria"]["type"], "note_count");

        let (status, got) = send(&app, "GET", "/api/v1/badges/a", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(got["name"], "A");

        let (status, updated) = send(&app, "PUT", "/api/v1/badges/a", Some(json!({"xpReward": 42}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["xpReward"], 42);

        let (status, msg) = send(&app, "DELETE", "/api/v1/badges/a", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(msg["message"], "Badge deactivated");

        let (_, list) = send(&app, "GET", "/api/v1/badges", None).await;
        assert_eq!(list.as_array().unwrap().len(), 0);
        let (_, list) = send(&app, "GET", "/api/v1/badges?includeInactive=true", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        // Still readable by id after deactivation.
        let (status, got) = send(&app, "GET", "/api/v1/badges/a", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(got["isActive"], false);
    }

    #[tokio::test]
    async fn missing_badge_is_404() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/v1/badges/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
        let (status, _) = send(&app, "PUT", "/api/v1/badges/nope", Some(json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", "/api/v1/badges/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_threshold_is_400() {
        let (status, body) = send(&app(), "POST", "/api/v1/badges", Some(badge_json("neg", "note_count", -2.0, 1, "level"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn filters_by_category_and_rarity() {
        let app = app();
        send(&app, "POST", "/api/v1/badges", Some(badge_json("s", "streak_days", 7.0, 10, "streak"))).await;
        send(&app, "POST", "/api/v1/badges", Some(badge_json("n", "note_count", 1.0, 10, "achievement"))).await;

        let (status, list) = send(&app, "GET", "/api/v1/badges/category/streak", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = list.as_array().unwrap().iter().map(|b| b["id"].as_str().unwrap().to_string()).collect();
        assert_eq!(ids, ["s"]);

        let (_, list) = send(&app, "GET", "/api/v1/badges/rarity/rare", None).await;
        assert_eq!(list.as_array().unwrap().len(), 2);
        let (status, list) = send(&app, "GET", "/api/v1/badges/rarity/mythic", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(list.as_array().unwrap().is_empty());

        let (_, list) = send(&app, "GET", "/api/v1/badges?criteriaType=note_count&limit=1", None).await;
        assert_eq!(list[0]["id"], "n");
    }

    #[tokio::test]
    async fn manual_award_flow() {
        let app = app();
        send(&app, "POST", "/api/v1/badges", Some(badge_json("a", "note_count", 1.0, 25, "achievement"))).await;
        let (status, _) = send(&app, "POST", "/api/v1/users", Some(json!({"id": "u1", "name": "Ada"}))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, msg) = send(&app, "POST", "/api/v1/users/u1/badges/a", Some(json!({"criteriaMet": "mentor pick"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(msg["message"], "Badge awarded successfully");

        let (status, msg) = send(&app, "POST", "/api/v1/users/u1/badges/a", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(msg["message"], "User already has this badge");

        let (_, user) = send(&app, "GET", "/api/v1/users/u1", None).await;
        assert_eq!(user["xp"], 25);
        assert_eq!(user["badges"].as_array().unwrap().len(), 1);
        assert_eq!(user["badges"][0]["criteriaMet"], "mentor pick");

        let (status, _) = send(&app, "POST", "/api/v1/users/ghost/badges/a", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "POST", "/api/v1/users/u1/badges/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn check_endpoint_awards_after_progress_update() {
        let app = app();
        send(&app, "POST", "/api/v1/badges", Some(badge_json("a", "note_count", 10.0, 10, "achievement"))).await;
        send(&app, "POST", "/api/v1/badges", Some(badge_json("b", "ai_usage", 5.0, 20, "engagement"))).await;
        send(&app, "POST", "/api/v1/badges", Some(badge_json("c", "rating", 4.0, 30, "special"))).await;
        send(&app, "POST", "/api/v1/users", Some(json!({"id": "u1", "name": "Ada"}))).await;

        let (status, user) = send(&app, "PATCH", "/api/v1/users/u1/progress", Some(json!({"totalNotes": 10}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["totalNotes"], 10);

        let body = json!({"event": "note_rated", "eventData": {"rating": 4.5}});
        let (status, awarded) = send(&app, "POST", "/api/v1/users/u1/badges/check", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = awarded.as_array().unwrap().iter().map(|b| b["id"].as_str().unwrap().to_string()).collect();
        assert_eq!(ids, ["a", "c"]);

        let (_, earned) = send(&app, "GET", "/api/v1/users/u1/badges", None).await;
        assert_eq!(earned.as_array().unwrap().len(), 2);
        assert_eq!(earned[0]["badge"]["id"], "a");
        let (_, user) = send(&app, "GET", "/api/v1/users/u1", None).await;
        assert_eq!(user["xp"], 40);

        let (status, _) = send(&app, "POST", "/api/v1/users/ghost/badges/check", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_user_is_400() {
        let app = app();
        send(&app, "POST", "/api/v1/users", Some(json!({"id": "u1", "name": "Ada"}))).await;
        let (status, body) = send(&app, "POST", "/api/v1/users", Some(json!({"id": "u1", "name": "Bob"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    async fn send_raw(app: &Router, uri: &str, content_type: &str, raw: &str) -> StatusCode {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", content_type)
            .body(Body::from(raw.to_string()))
            .unwrap();
        app.clone().oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn malformed_award_bodies_are_rejected_without_side_effects() {
        let app = app();
        send(&app, "POST", "/api/v1/badges", Some(badge_json("first", "note_count", 1.0, 10, "achievement"))).await;
        send(&app, "POST", "/api/v1/badges", Some(badge_json("manual", "xp_level", 99.0, 100, "level"))).await;
        send(&app, "POST", "/api/v1/users", Some(json!({"id": "u1", "name": "Ada", "totalNotes": 1}))).await;

        let json_ct = "application/json";
        assert_eq!(send_raw(&app, "/api/v1/users/u1/badges/check", json_ct, r#"{"eventData":{"rating":"4.5"}}"#).await, StatusCode::BAD_REQUEST);
        assert_eq!(send_raw(&app, "/api/v1/users/u1/badges/check", json_ct, "{not json").await, StatusCode::BAD_REQUEST);
        assert_eq!(send_raw(&app, "/api/v1/users/u1/badges/manual", json_ct, r#"{"criteriaMet": "#).await, StatusCode::BAD_REQUEST);
        assert_eq!(send_raw(&app, "/api/v1/users/u1/badges/manual", "text/plain", "garbage").await, StatusCode::BAD_REQUEST);

        let (_, user) = send(&app, "GET", "/api/v1/users/u1", None).await;
        assert_eq!(user["xp"], 0);
        assert!(user["badges"].as_array().unwrap().is_empty());

        // An empty body is still an omitted body.
        assert_eq!(send_raw(&app, "/api/v1/users/u1/badges/check", json_ct, "").await, StatusCode::OK);
        let (_, user) = send(&app, "GET", "/api/v1/users/u1", None).await;
        assert_eq!(user["xp"], 10);
    }

    #[tokio::test]
    async fn reserved_check_id_is_400() {
        let (status, body) = send(&app(), "POST", "/api/v1/badges", Some(badge_json("check", "note_count", 1.0, 1, "achievement"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn custom_category_round_trips() {
        let app = app();
        let (status, created) = send(&app, "POST", "/api/v1/badges", Some(badge_json("club", "shared_notes", 3.0, 5, "study_group"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["category"], "study_group");
        let (_, list) = send(&app, "GET", "/api/v1/badges/category/study_group", None).await;
        assert_eq!(list[0]["id"], "club");
    }

    #[test]
    fn optional_json_defaults_only_when_empty() {
        let check: crate::protocol::CheckIn = optional_json(&Bytes::from_static(b"  \n")).unwrap();
        assert_eq!(check.event, "");
        let check: crate::protocol::CheckIn = optional_json(&Bytes::from_static(br#"{"event":"note_uploaded"}"#)).unwrap();
        assert_eq!(check.event, "note_uploaded");
        let err = optional_json::<crate::protocol::CheckIn>(&Bytes::from_static(b"[1,2")).unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }
}
