use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use super::blocking;
use crate::accessors::require_user;
use crate::db::models::{PostWithAuthor, User};
use crate::db::posts;
use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/collections", get(list_collections))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<User>> {
    let accessors = state.accessors.clone();
    let user = blocking(move || Ok(accessors.get_user(id)?)).await?;
    Ok(Json(user))
}

/// Posts the user has collected, most recent first.
async fn list_collections(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<PostWithAuthor>>> {
    let db = state.db.clone();
    let collected = blocking(move || {
        let conn = db.get()?;
        require_user(&conn, id)?;
        Ok(posts::list_collected_by(&conn, id)?)
    })
    .await?;
    Ok(Json(collected))
}
