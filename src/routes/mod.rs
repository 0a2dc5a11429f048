pub mod auth;
pub mod comments;
pub mod engagement;
pub mod posts;
pub mod uploads;
pub mod users;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The full HTTP surface, ready to serve.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(posts::router(state.config.max_upload_bytes()))
        .merge(engagement::router())
        .merge(comments::router())
        .merge(users::router())
        .merge(uploads::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs SQLite and bcrypt work on the blocking pool. Writers can sit out
/// `busy_timeout`, which must not stall the async workers.
pub(crate) async fn blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
}
