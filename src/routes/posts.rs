use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::blocking;
use crate::accessors::require_user;
use crate::db::models::{Post, PostType, PostWithAuthor};
use crate::db::posts::{self, NewPost};
use crate::engagement::PostTotals;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage;

const MAX_TITLE_LEN: usize = 100;

// --- Requests / responses ---

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub url: String,
    pub cover_url: Option<String>,
    pub author_id: i64,
}

#[derive(Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    #[serde(flatten)]
    pub totals: PostTotals,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub url: String,
}

// --- Router ---

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/upload",
            post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/posts/{id}", get(get_post))
}

// --- Handlers ---

async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<PostWithAuthor>>> {
    let db = state.db.clone();
    let posts = blocking(move || {
        let conn = db.get()?;
        Ok(posts::list_with_authors(&conn)?)
    })
    .await?;
    Ok(Json(posts))
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn create_post(
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<Response> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Post title cannot be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(format!(
            "Post title must be {} characters or less",
            MAX_TITLE_LEN
        )));
    }
    let url = req.url.trim().to_string();
    if url.is_empty() {
        return Err(AppError::BadRequest("Post url cannot be empty".into()));
    }
    let description = optional_text(req.description);
    let cover_url = optional_text(req.cover_url);

    let db = state.db.clone();
    let post = blocking(move || {
        let conn = db.get()?;
        require_user(&conn, req.author_id)?;
        Ok(posts::insert(
            &conn,
            &NewPost {
                title: &title,
                description: description.as_deref(),
                post_type: req.post_type,
                url: &url,
                cover_url: cover_url.as_deref(),
                author_id: req.author_id,
            },
        )?)
    })
    .await?;

    tracing::info!("User {} created post {}", post.author_id, post.id);
    Ok((StatusCode::CREATED, Json(post)).into_response())
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PostDetail>> {
    let counter = state.counter.clone();
    let (post, totals) = blocking(move || Ok(counter.post_with_totals(id)?)).await?;
    Ok(Json(PostDetail { post, totals }))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".into()));
        }

        let name =
            storage::save_upload(&state.config.uploads_path(), &original_name, &data).await?;
        return Ok(Json(UploadResponse {
            url: state.config.upload_url(&name),
        }));
    }

    Err(AppError::BadRequest("Missing file field".into()))
}
