use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use rusqlite::TransactionBehavior;
use serde::Deserialize;

use super::blocking;
use crate::accessors::{require_post, require_user};
use crate::db::comments::{self, NewComment};
use crate::db::models::{CommentNode, CommentWithAuthor};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const MAX_COMMENT_LEN: usize = 500;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub user_id: i64,
    pub content: String,
    pub parent_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentRequest {
    pub user_id: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/posts/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/posts/comments/{id}", delete(delete_comment))
}

fn validate_content(content: &str) -> AppResult<()> {
    if content.is_empty() {
        return Err(AppError::BadRequest("Comment cannot be empty".into()));
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::BadRequest(format!(
            "Comment must be {} characters or less",
            MAX_COMMENT_LEN
        )));
    }
    Ok(())
}

async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<Json<Vec<CommentNode>>> {
    let db = state.db.clone();
    let thread = blocking(move || {
        let mut conn = db.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        require_post(&tx, post_id)?;
        let thread = comments::thread_for_post(&tx, post_id)?;
        tx.commit()?;
        Ok(thread)
    })
    .await?;
    Ok(Json(thread))
}

async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<Response> {
    let content = req.content.trim().to_string();
    validate_content(&content)?;

    let db = state.db.clone();
    let created = blocking(move || {
        let mut conn = db.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let author = require_user(&tx, req.user_id)?;
        require_post(&tx, post_id)?;

        if let Some(parent_id) = req.parent_id {
            let parent = comments::find_by_id(&tx, parent_id)?
                .ok_or(AppError::CommentNotFound(parent_id))?;
            if parent.post_id != post_id {
                return Err(AppError::BadRequest(
                    "Parent comment belongs to another post".into(),
                ));
            }
        }

        let comment = comments::insert(
            &tx,
            &NewComment {
                post_id,
                user_id: author.id,
                parent_id: req.parent_id,
                content: &content,
            },
        )?;
        tx.commit()?;

        Ok(CommentWithAuthor {
            comment,
            author: author.nickname,
            author_avatar: author.avatar,
        })
    })
    .await?;

    tracing::info!(
        "User {} commented on post {} ({})",
        created.comment.user_id,
        post_id,
        created.comment.id
    );
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
    Json(req): Json<DeleteCommentRequest>,
) -> AppResult<StatusCode> {
    let db = state.db.clone();
    blocking(move || {
        let mut conn = db.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let comment =
            comments::find_by_id(&tx, comment_id)?.ok_or(AppError::CommentNotFound(comment_id))?;
        if comment.user_id != req.user_id {
            return Err(AppError::Forbidden(
                "Only the author can delete a comment".into(),
            ));
        }
        comments::delete(&tx, comment_id)?;
        tx.commit()?;
        Ok(())
    })
    .await?;

    tracing::info!("User {} deleted comment {}", req.user_id, comment_id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_must_be_present_and_bounded() {
        assert!(validate_content("").is_err());
        assert!(validate_content("looks great").is_ok());
        assert!(matches!(
            validate_content(&"x".repeat(MAX_COMMENT_LEN + 1)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn create_request_reads_camel_case() {
        let req: CreateCommentRequest =
            serde_json::from_str(r#"{"userId": 2, "content": "hi", "parentId": 5}"#).unwrap();
        assert_eq!(req.user_id, 2);
        assert_eq!(req.parent_id, Some(5));

        let top: CreateCommentRequest =
            serde_json::from_str(r#"{"userId": 2, "content": "hi"}"#).unwrap();
        assert!(top.parent_id.is_none());
    }
}
