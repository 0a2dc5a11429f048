use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::blocking;
use crate::db::models::{EngagementKind, EngagementRelation};
use crate::engagement::EngagementStatus;
use crate::error::AppResult;
use crate::state::AppState;

// --- Requests / responses ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub user_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectResponse {
    pub collected: bool,
    pub collection_count: u64,
}

/// Each kind keeps its own field names on the wire.
fn respond(kind: EngagementKind, status: EngagementStatus) -> Response {
    match kind {
        EngagementKind::Like => Json(LikeResponse {
            liked: status.active,
            like_count: status.count,
        })
        .into_response(),
        EngagementKind::Collection => Json(CollectResponse {
            collected: status.active,
            collection_count: status.count,
        })
        .into_response(),
    }
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{id}/like", post(toggle_like))
        .route("/posts/{id}/like/status", get(like_status))
        .route("/posts/{id}/collect", post(toggle_collect))
        .route("/posts/{id}/collect/status", get(collect_status))
        .route("/posts/{id}/likes", get(list_likes))
        .route("/posts/{id}/collectors", get(list_collectors))
}

// --- Handlers ---

async fn toggle(
    state: &AppState,
    post_id: i64,
    user_id: i64,
    kind: EngagementKind,
) -> AppResult<Response> {
    let ledger = state.ledger.clone();
    let status = blocking(move || Ok(ledger.toggle_with_count(user_id, post_id, kind)?)).await?;

    tracing::info!(
        user_id,
        post_id,
        %kind,
        active = status.active,
        count = status.count,
        "engagement toggled"
    );
    Ok(respond(kind, status))
}

async fn status(
    state: &AppState,
    post_id: i64,
    user_id: i64,
    kind: EngagementKind,
) -> AppResult<Response> {
    let ledger = state.ledger.clone();
    let status = blocking(move || Ok(ledger.status(user_id, post_id, kind)?)).await?;
    Ok(respond(kind, status))
}

async fn relations(
    state: &AppState,
    post_id: i64,
    kind: EngagementKind,
) -> AppResult<Json<Vec<EngagementRelation>>> {
    let ledger = state.ledger.clone();
    let relations = blocking(move || Ok(ledger.relations(post_id, kind)?)).await?;
    Ok(Json(relations))
}

async fn toggle_like(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(req): Json<ToggleRequest>,
) -> AppResult<Response> {
    toggle(&state, post_id, req.user_id, EngagementKind::Like).await
}

async fn like_status(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Response> {
    status(&state, post_id, query.user_id, EngagementKind::Like).await
}

async fn toggle_collect(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(req): Json<ToggleRequest>,
) -> AppResult<Response> {
    toggle(&state, post_id, req.user_id, EngagementKind::Collection).await
}

async fn collect_status(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Response> {
    status(&state, post_id, query.user_id, EngagementKind::Collection).await
}

/// Who liked the post, oldest first.
async fn list_likes(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<Json<Vec<EngagementRelation>>> {
    relations(&state, post_id, EngagementKind::Like).await
}

async fn list_collectors(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<Json<Vec<EngagementRelation>>> {
    relations(&state, post_id, EngagementKind::Collection).await
}
