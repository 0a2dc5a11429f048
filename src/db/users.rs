use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{Gender, User};

const USER_COLUMNS: &str = "id, username, password_hash, nickname, avatar, gender, bio, created_at";

pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub nickname: &'a str,
    pub avatar: &'a str,
}

/// Fields a profile update may touch. `None` leaves the column alone.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<Gender>,
    pub bio: Option<String>,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        nickname: row.get(3)?,
        avatar: row.get(4)?,
        gender: row.get(5)?,
        bio: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
        params![username],
        from_row,
    )
    .optional()
}

/// Inserts a user. A taken username surfaces as a UNIQUE violation.
pub fn insert(conn: &Connection, user: &NewUser<'_>) -> rusqlite::Result<User> {
    conn.query_row(
        &format!(
            "INSERT INTO users (username, password_hash, nickname, avatar)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {USER_COLUMNS}"
        ),
        params![user.username, user.password_hash, user.nickname, user.avatar],
        from_row,
    )
}

pub fn update_profile(
    conn: &Connection,
    id: i64,
    update: &ProfileUpdate,
) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!(
            "UPDATE users SET
               nickname = COALESCE(?2, nickname),
               avatar = COALESCE(?3, avatar),
               gender = COALESCE(?4, gender),
               bio = COALESCE(?5, bio)
             WHERE id = ?1
             RETURNING {USER_COLUMNS}"
        ),
        params![id, update.nickname, update.avatar, update.gender, update.bio],
        from_row,
    )
    .optional()
}
