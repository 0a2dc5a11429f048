use rusqlite::{params, Connection, TransactionBehavior};
use serde::Serialize;

use super::counter::count_in;
use crate::accessors::{require_post, require_user};
use crate::db::models::{EngagementKind, EngagementRelation};
use crate::db::{is_unique_violation, StoreError};
use crate::state::DbPool;

/// Result of a toggle: whether the relation exists afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toggled {
    pub active: bool,
}

/// Membership plus the post's count for the same kind, read from one
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngagementStatus {
    pub active: bool,
    pub count: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Insertion {
    Created,
    /// The UNIQUE (user_id, post_id, kind) constraint rejected the row.
    AlreadyPresent,
}

/// Inserts the relation, mapping a uniqueness violation to `AlreadyPresent`.
pub(crate) fn insert_relation(
    conn: &Connection,
    user_id: i64,
    post_id: i64,
    kind: EngagementKind,
) -> Result<Insertion, StoreError> {
    match conn.execute(
        "INSERT INTO engagements (user_id, post_id, kind) VALUES (?1, ?2, ?3)",
        params![user_id, post_id, kind],
    ) {
        Ok(_) => Ok(Insertion::Created),
        Err(e) if is_unique_violation(&e) => Ok(Insertion::AlreadyPresent),
        Err(e) => Err(e.into()),
    }
}

fn exists_in(
    conn: &Connection,
    user_id: i64,
    post_id: i64,
    kind: EngagementKind,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM engagements WHERE user_id = ?1 AND post_id = ?2 AND kind = ?3",
        params![user_id, post_id, kind],
        |r| r.get(0),
    )
}

/// Flip the relation. Callers must already hold a write transaction.
fn flip(
    conn: &Connection,
    user_id: i64,
    post_id: i64,
    kind: EngagementKind,
) -> Result<Toggled, StoreError> {
    require_user(conn, user_id)?;
    require_post(conn, post_id)?;

    let removed = conn.execute(
        "DELETE FROM engagements WHERE user_id = ?1 AND post_id = ?2 AND kind = ?3",
        params![user_id, post_id, kind],
    )?;
    if removed > 0 {
        tracing::debug!(user_id, post_id, %kind, "engagement removed");
        return Ok(Toggled { active: false });
    }

    match insert_relation(conn, user_id, post_id, kind)? {
        Insertion::Created => {
            tracing::debug!(user_id, post_id, %kind, "engagement added");
        }
        // Only another writer outside an IMMEDIATE transaction can get here.
        Insertion::AlreadyPresent => {
            tracing::debug!(
                user_id,
                post_id,
                %kind,
                "duplicate engagement insert reconciled as active"
            );
        }
    }
    Ok(Toggled { active: true })
}

/// Tracks which users like or have collected which posts.
///
/// Every write runs inside a `BEGIN IMMEDIATE` transaction: SQLite admits
/// one writer at a time, so toggles on the same (user, post, kind) are
/// applied one after another and each either commits whole or rolls back.
/// Reads use a deferred transaction and see a single committed snapshot.
pub struct EngagementLedger {
    pool: DbPool,
}

impl EngagementLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn write<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // Dropping `tx` on the error path rolls it back.
        let out = op(&*tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn read<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let out = op(&*tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Adds the relation if absent, removes it if present.
    pub fn toggle(
        &self,
        user_id: i64,
        post_id: i64,
        kind: EngagementKind,
    ) -> Result<Toggled, StoreError> {
        self.write(|conn| flip(conn, user_id, post_id, kind))
    }

    /// Toggle and read the post's new count in the same transaction.
    pub fn toggle_with_count(
        &self,
        user_id: i64,
        post_id: i64,
        kind: EngagementKind,
    ) -> Result<EngagementStatus, StoreError> {
        self.write(|conn| {
            let Toggled { active } = flip(conn, user_id, post_id, kind)?;
            let count = count_in(conn, post_id, kind)?;
            Ok(EngagementStatus { active, count })
        })
    }

    pub fn is_active(
        &self,
        user_id: i64,
        post_id: i64,
        kind: EngagementKind,
    ) -> Result<bool, StoreError> {
        self.read(|conn| {
            require_user(conn, user_id)?;
            require_post(conn, post_id)?;
            Ok(exists_in(conn, user_id, post_id, kind)?)
        })
    }

    pub fn status(
        &self,
        user_id: i64,
        post_id: i64,
        kind: EngagementKind,
    ) -> Result<EngagementStatus, StoreError> {
        self.read(|conn| {
            require_user(conn, user_id)?;
            require_post(conn, post_id)?;
            Ok(EngagementStatus {
                active: exists_in(conn, user_id, post_id, kind)?,
                count: count_in(conn, post_id, kind)?,
            })
        })
    }

    /// Relations of `kind` on a post, oldest first.
    pub fn relations(
        &self,
        post_id: i64,
        kind: EngagementKind,
    ) -> Result<Vec<EngagementRelation>, StoreError> {
        self.read(|conn| {
            require_post(conn, post_id)?;
            let mut stmt = conn.prepare(
                "SELECT id, user_id, post_id, kind, created_at FROM engagements
                 WHERE post_id = ?1 AND kind = ?2
                 ORDER BY id",
            )?;
            let relations = stmt
                .query_map(params![post_id, kind], |row| {
                    Ok(EngagementRelation {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        post_id: row.get(2)?,
                        kind: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(relations)
        })
    }
}
