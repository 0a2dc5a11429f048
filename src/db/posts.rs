use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{EngagementKind, Post, PostType, PostWithAuthor};

const POST_COLUMNS: &str =
    "p.id, p.title, p.description, p.type, p.url, p.cover_url, p.author_id, p.created_at";

pub struct NewPost<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub post_type: PostType,
    pub url: &'a str,
    pub cover_url: Option<&'a str>,
    pub author_id: i64,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        post_type: row.get(3)?,
        url: row.get(4)?,
        cover_url: row.get(5)?,
        author_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn with_author_from_row(row: &Row<'_>) -> rusqlite::Result<PostWithAuthor> {
    Ok(PostWithAuthor {
        post: from_row(row)?,
        author: row.get(8)?,
        author_avatar: row.get(9)?,
    })
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Post>> {
    conn.query_row(
        &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

/// Inserts a post. An unknown author surfaces as a FOREIGN KEY violation.
pub fn insert(conn: &Connection, post: &NewPost<'_>) -> rusqlite::Result<Post> {
    conn.query_row(
        "INSERT INTO posts (title, description, type, url, cover_url, author_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id, title, description, type, url, cover_url, author_id, created_at",
        params![
            post.title,
            post.description,
            post.post_type,
            post.url,
            post.cover_url,
            post.author_id
        ],
        from_row,
    )
}

/// All posts, newest first, with their author's nickname and avatar.
pub fn list_with_authors(conn: &Connection) -> rusqlite::Result<Vec<PostWithAuthor>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS}, u.nickname, u.avatar
         FROM posts p
         JOIN users u ON u.id = p.author_id
         ORDER BY p.created_at DESC, p.id DESC"
    ))?;

    let posts = stmt
        .query_map([], with_author_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Posts `user_id` has collected, most recently collected first.
pub fn list_collected_by(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<PostWithAuthor>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS}, u.nickname, u.avatar
         FROM engagements e
         JOIN posts p ON p.id = e.post_id
         JOIN users u ON u.id = p.author_id
         WHERE e.user_id = ?1 AND e.kind = ?2
         ORDER BY e.created_at DESC, e.id DESC"
    ))?;

    let posts = stmt
        .query_map(
            params![user_id, EngagementKind::Collection],
            with_author_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::users::{self, NewUser};

    fn author(conn: &Connection, username: &str) -> i64 {
        users::insert(
            conn,
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

    fn image(author_id: i64, title: &str) -> NewPost<'_> {
        NewPost {
            title,
            description: None,
            post_type: PostType::Image,
            url: "http://localhost/uploads/x.png",
            cover_url: None,
            author_id,
        }
    }

    #[test]
    fn insert_then_find() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let alice = author(&conn, "alice");

        let post = insert(&conn, &image(alice, "Sunset")).unwrap();
        assert_eq!(post.author_id, alice);
        assert_eq!(post.post_type, PostType::Image);
        assert!(!post.created_at.is_empty());

        let found = find_by_id(&conn, post.id).unwrap().unwrap();
        assert_eq!(found.title, "Sunset");
        assert!(find_by_id(&conn, post.id + 1).unwrap().is_none());
    }

    #[test]
    fn insert_with_unknown_author_fails() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        assert!(insert(&conn, &image(404, "Orphan")).is_err());
    }

    #[test]
    fn list_is_newest_first_with_author_fields() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let alice = author(&conn, "alice");

        insert(&conn, &image(alice, "first")).unwrap();
        insert(&conn, &image(alice, "second")).unwrap();

        let posts = list_with_authors(&conn).unwrap();
        let titles: Vec<&str> = posts.iter().map(|p| p.post.title.as_str()).collect();
        assert_eq!(titles, ["second", "first"]);
        assert_eq!(posts[0].author, "alice");
        assert_eq!(posts[0].author_avatar, "a.png");
    }

    #[test]
    fn list_collected_only_returns_collections_of_that_user() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let alice = author(&conn, "alice");
        let bob = author(&conn, "bob");
        let kept = insert(&conn, &image(alice, "kept")).unwrap();
        let liked = insert(&conn, &image(alice, "liked")).unwrap();

        let add = "INSERT INTO engagements (user_id, post_id, kind) VALUES (?1, ?2, ?3)";
        conn.execute(add, params![bob, kept.id, EngagementKind::Collection])
            .unwrap();
        conn.execute(add, params![bob, liked.id, EngagementKind::Like])
            .unwrap();
        conn.execute(add, params![alice, liked.id, EngagementKind::Collection])
            .unwrap();

        let collected = list_collected_by(&conn, bob).unwrap();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].post.id, kept.id);
    }
}
