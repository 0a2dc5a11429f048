use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{Comment, CommentNode, CommentWithAuthor};

const COMMENT_COLUMNS: &str = "c.id, c.post_id, c.user_id, c.parent_id, c.content, c.created_at";

pub struct NewComment<'a> {
    pub post_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub content: &'a str,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        parent_id: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Comment>> {
    conn.query_row(
        &format!("SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

pub fn insert(conn: &Connection, comment: &NewComment<'_>) -> rusqlite::Result<Comment> {
    conn.query_row(
        "INSERT INTO comments (post_id, user_id, parent_id, content)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id, post_id, user_id, parent_id, content, created_at",
        params![
            comment.post_id,
            comment.user_id,
            comment.parent_id,
            comment.content
        ],
        from_row,
    )
}

/// Deletes a comment; its replies cascade. Returns the number of rows
/// removed by the statement itself (0 or 1).
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM comments WHERE id = ?1", params![id])
}

/// The post's comments as a reply tree: top level newest first, replies
/// under each comment oldest first.
pub fn thread_for_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<CommentNode>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMENT_COLUMNS}, u.nickname, u.avatar
         FROM comments c
         JOIN users u ON u.id = c.user_id
         WHERE c.post_id = ?1
         ORDER BY c.created_at, c.id"
    ))?;

    let entries = stmt
        .query_map(params![post_id], |row| {
            Ok(CommentWithAuthor {
                comment: from_row(row)?,
                author: row.get(6)?,
                author_avatar: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(build_thread(entries))
}

/// `entries` must be oldest first.
fn build_thread(entries: Vec<CommentWithAuthor>) -> Vec<CommentNode> {
    let mut by_parent: HashMap<Option<i64>, Vec<CommentWithAuthor>> = HashMap::new();
    for entry in entries {
        by_parent.entry(entry.comment.parent_id).or_default().push(entry);
    }

    let mut roots = attach(None, &mut by_parent);
    roots.reverse();
    roots
}

fn attach(
    parent: Option<i64>,
    by_parent: &mut HashMap<Option<i64>, Vec<CommentWithAuthor>>,
) -> Vec<CommentNode> {
    by_parent
        .remove(&parent)
        .unwrap_or_default()
        .into_iter()
        .map(|entry| {
            let replies = attach(Some(entry.comment.id), by_parent);
            CommentNode { entry, replies }
        })
        .collect()
}
