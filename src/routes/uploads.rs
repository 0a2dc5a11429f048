use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage;

pub fn router() -> Router<AppState> {
    Router::new().route("/uploads/{name}", get(serve))
}

async fn serve(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<Response> {
    let path = storage::resolve(&state.config.uploads_path(), &name).ok_or(AppError::NotFound)?;

    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, storage::content_type(&name)),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        data,
    )
        .into_response())
}
