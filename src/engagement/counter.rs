use rusqlite::{params, Connection, TransactionBehavior};
use serde::Serialize;

use crate::accessors::require_post;
use crate::db::models::{EngagementKind, Post};
use crate::db::StoreError;
use crate::state::DbPool;

/// Number of `kind` relations recorded on `post_id`, read through `conn`.
pub(crate) fn count_in(
    conn: &Connection,
    post_id: i64,
    kind: EngagementKind,
) -> rusqlite::Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM engagements WHERE post_id = ?1 AND kind = ?2",
        params![post_id, kind],
        |r| r.get(0),
    )?;
    Ok(u64::try_from(n).unwrap_or(0))
}

/// Both counts for one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTotals {
    pub like_count: u64,
    pub collection_count: u64,
}

/// Derives like/collection counts from the relation table on every call.
/// No counter columns are maintained.
pub struct EngagementCounter {
    pool: DbPool,
}

impl EngagementCounter {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn count(&self, post_id: i64, kind: EngagementKind) -> Result<u64, StoreError> {
        let conn = self.pool.get()?;
        require_post(&conn, post_id)?;
        Ok(count_in(&conn, post_id, kind)?)
    }

    /// The post and both of its counts, read from one snapshot.
    pub fn post_with_totals(&self, post_id: i64) -> Result<(Post, PostTotals), StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let post = require_post(&tx, post_id)?;
        let totals = PostTotals {
            like_count: count_in(&tx, post_id, EngagementKind::Like)?,
            collection_count: count_in(&tx, post_id, EngagementKind::Collection)?,
        };
        tx.commit()?;
        Ok((post, totals))
    }
}
