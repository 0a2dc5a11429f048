pub mod comments;
pub mod models;
pub mod posts;
pub mod users;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

use crate::state::DbPool;

pub const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_initial",
        include_str!("../../migrations/001_initial.sql"),
    ),
    (
        "002_engagements",
        include_str!("../../migrations/002_engagements.sql"),
    ),
    ("003_comments", include_str!("../../migrations/003_comments.sql")),
];

/// Errors raised by the entity store and the components layered on it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("Post {0} not found")]
    PostNotFound(i64),

    #[error("Store unavailable: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Store unavailable: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Per-connection settings. r2d2 hands out several connections, and
/// `foreign_keys` / `busy_timeout` do not persist across them.
fn configure_connection(conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )
}

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(configure_connection);
    let pool = Pool::builder().max_size(8).build(manager)?;

    // journal_mode is stored in the database file, once is enough
    let conn = pool.get()?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        ",
    )?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    // Create migrations tracking table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    tracing::info!("Database migrations complete");
    Ok(())
}

/// True when `err` is SQLite rejecting a row that breaks a UNIQUE constraint.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
pub(crate) fn test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory().with_init(configure_connection);
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    run_migrations(&pool).unwrap();
    pool
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::models::PostType;
    use super::posts::{self, NewPost};
    use super::users::{self, NewUser};
    use crate::state::DbPool;

    pub fn user(pool: &DbPool, username: &str) -> i64 {
        let conn = pool.get().unwrap();
        users::insert(
            &conn,
            &NewUser {
                username,
                password_hash: "hash",
                nickname: username,
                avatar: "a.png",
            },
        )
        .unwrap()
        .id
    }

    pub fn post(pool: &DbPool, author_id: i64) -> i64 {
        let conn = pool.get().unwrap();
        posts::insert(
            &conn,
            &NewPost {
                title: "Sunset",
                description: None,
                post_type: PostType::Image,
                url: "u.png",
                cover_url: None,
                author_id,
            },
        )
        .unwrap()
        .id
    }
}
