use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::auth::password;
use crate::db::models::{Gender, User};
use crate::db::users::{self, NewUser, ProfileUpdate};
use crate::db::is_unique_violation;
use crate::error::{AppError, AppResult};
use crate::routes::blocking;
use crate::state::AppState;

const MAX_USERNAME_LEN: usize = 32;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub nickname: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<Gender>,
    pub bio: Option<String>,
}

/// Normalise an optional display field: blank means "not provided".
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_credentials(username: &str, password: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(AppError::BadRequest("Username cannot be empty".into()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Username must be {} characters or less",
            MAX_USERNAME_LEN
        )));
    }
    if password.is_empty() {
        return Err(AppError::BadRequest("Password cannot be empty".into()));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Response> {
    let username = req.username.trim().to_string();
    validate_credentials(&username, &req.password)?;
    let nickname = non_blank(req.nickname).unwrap_or_else(|| username.clone());
    let avatar = state.config.default_avatar(&username);
    let cost = state.config.auth.bcrypt_cost;
    let plaintext = req.password;

    let db = state.db.clone();
    let user = blocking(move || {
        let password_hash = password::hash(&plaintext, cost)?;
        let conn = db.get()?;
        users::insert(
            &conn,
            &NewUser {
                username: &username,
                password_hash: &password_hash,
                nickname: &nickname,
                avatar: &avatar,
            },
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Username already exists".into())
            } else {
                AppError::Database(e)
            }
        })
    })
    .await?;

    tracing::info!("Registered user {} ({})", user.username, user.id);
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<User>> {
    let db = state.db.clone();
    let user = blocking(move || {
        let conn = db.get()?;
        let user = users::find_by_username(&conn, req.username.trim())?
            .ok_or(AppError::InvalidCredentials)?;
        if !password::verify(&req.password, &user.password_hash) {
            tracing::info!("Failed login for {}", user.username);
            return Err(AppError::InvalidCredentials);
        }
        Ok(user)
    })
    .await?;
    Ok(Json(user))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    let user_id = req.user_id;
    let update = ProfileUpdate {
        nickname: non_blank(req.nickname),
        avatar: non_blank(req.avatar),
        gender: req.gender,
        bio: req.bio,
    };

    let db = state.db.clone();
    let user = blocking(move || {
        let conn = db.get()?;
        users::update_profile(&conn, user_id, &update)?.ok_or(AppError::UserNotFound(user_id))
    })
    .await?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_not_provided() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" Ann ".into())), Some("Ann".into()));
    }

    #[test]
    fn credentials_must_be_present() {
        assert!(validate_credentials("", "pw").is_err());
        assert!(validate_credentials("alice", "").is_err());
        assert!(validate_credentials("alice", "pw").is_ok());
    }

    #[test]
    fn username_length_is_capped() {
        let long = "x".repeat(MAX_USERNAME_LEN + 1);
        assert!(matches!(
            validate_credentials(&long, "pw"),
            Err(AppError::BadRequest(_))
        ));
    }
}
