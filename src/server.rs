// HTTP surface: thin axum handlers over the orchestration layer.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::app::{self, AppError, AppState, LeagueDataResponse};
use crate::model::{DraftPick, UpdateDraftPick};
use crate::sleeper::types::SleeperAccount;

/// Header carrying the caller's Sleeper user id for prediction writes.
const USER_ID_HEADER: &str = "x-user-id";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            AppError::Upstream(m) => (StatusCode::BAD_GATEWAY, m.clone()),
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/league/{id}/fetch", post(fetch_league))
        .route("/api/league/{id}", get(get_league_data))
        .route("/api/league/{id}/team-order", put(set_team_order))
        .route("/api/picks/{id}", patch(update_pick))
        .route(
            "/api/picks/{id}/prediction",
            post(save_prediction).delete(delete_prediction),
        )
        .route("/api/user/{username}", get(lookup_user))
        .with_state(state)
}

async fn fetch_league(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    app::sync_league(&state, &id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn get_league_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LeagueDataResponse>, AppError> {
    Ok(Json(app::league_data(&state, &id).await?))
}

async fn update_pick(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateDraftPick>,
) -> Result<Json<DraftPick>, AppError> {
    Ok(Json(app::update_pick(&state, id, &update)?))
}

#[derive(Debug, Deserialize)]
struct TeamOrderBody {
    order: Vec<u32>,
}

async fn set_team_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<TeamOrderBody>,
) -> Result<Json<Value>, AppError> {
    app::set_team_order(&state, &id, &body.order)?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct PredictionBody {
    comment: String,
}

async fn save_prediction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<PredictionBody>,
) -> Result<Json<Value>, AppError> {
    app::save_prediction(&state, id, caller_user_id(&headers), &body.comment)?;
    Ok(Json(json!({ "success": true })))
}

async fn delete_prediction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    app::delete_prediction(&state, id, caller_user_id(&headers))?;
    Ok(Json(json!({ "success": true })))
}

async fn lookup_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<SleeperAccount>, AppError> {
    Ok(Json(app::lookup_user(&state, &username).await?))
}

fn caller_user_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_ID_HEADER).and_then(|v| v.to_str().ok())
}
