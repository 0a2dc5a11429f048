//! Lookup-by-id for users and posts.
//!
//! The engagement ledger validates its foreign keys through the
//! connection-scoped helpers so the check and the write share one
//! transaction. Nothing here caches or mutates.

use rusqlite::Connection;

use crate::db::models::{Post, User};
use crate::db::{posts, users, StoreError};
use crate::state::DbPool;

pub fn require_user(conn: &Connection, id: i64) -> Result<User, StoreError> {
    users::find_by_id(conn, id)?.ok_or(StoreError::UserNotFound(id))
}

pub fn require_post(conn: &Connection, id: i64) -> Result<Post, StoreError> {
    posts::find_by_id(conn, id)?.ok_or(StoreError::PostNotFound(id))
}

pub struct Accessors {
    pool: DbPool,
}

impl Accessors {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn get_user(&self, id: i64) -> Result<User, StoreError> {
        let conn = self.pool.get()?;
        require_user(&conn, id)
    }

    pub fn get_post(&self, id: i64) -> Result<Post, StoreError> {
        let conn = self.pool.get()?;
        require_post(&conn, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PostType;
    use crate::db::posts::NewPost;
    use crate::db::test_pool;
    use crate::db::users::NewUser;

    fn seeded() -> (Accessors, i64, i64) {
        let pool = test_pool();
        let (user_id, post_id) = {
            let conn = pool.get().unwrap();
            let user = users::insert(
                &conn,
                &NewUser {
                    username: "alice",
                    password_hash: "hash",
                    nickname: "Alice",
                    avatar: "a.png",
                },
            )
            .unwrap();
            let post = posts::insert(
                &conn,
                &NewPost {
                    title: "Sunset",
                    description: Some("over the bay"),
                    post_type: PostType::Image,
                    url: "u.png",
                    cover_url: None,
                    author_id: user.id,
                },
            )
            .unwrap();
            (user.id, post.id)
        };
        (Accessors::new(pool), user_id, post_id)
    }

    #[test]
    fn resolves_existing_ids() {
        let (accessors, user_id, post_id) = seeded();
        assert_eq!(accessors.get_user(user_id).unwrap().username, "alice");
        assert_eq!(accessors.get_post(post_id).unwrap().author_id, user_id);
    }

    #[test]
    fn missing_ids_name_the_missing_entity() {
        let (accessors, user_id, post_id) = seeded();
        assert!(matches!(
            accessors.get_user(user_id + 100),
            Err(StoreError::UserNotFound(id)) if id == user_id + 100
        ));
        assert!(matches!(
            accessors.get_post(post_id + 100),
            Err(StoreError::PostNotFound(id)) if id == post_id + 100
        ));
    }
}
