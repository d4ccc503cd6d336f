#![forbid(unsafe_code)]

use super::StoreError;
use fr_core::ids::OwnerId;
use fr_core::ranked::{CollectionKind, NewRankedItem, RankChange, RankedError, RankedItem, RankedRows};
use rusqlite::{Connection, params};

/// `RankedRows` over the connection of an open transaction.
///
/// The caller owns the transaction; nothing here commits.
pub(crate) struct SqlRows<'a> {
    conn: &'a Connection,
}

impl<'a> SqlRows<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl RankedRows for SqlRows<'_> {
    type Error = StoreError;

    fn list_by_owner(
        &mut self,
        kind: CollectionKind,
        owner: &OwnerId,
    ) -> Result<Vec<RankedItem>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, owner_id, item_id, rank, last_activity_at_ms, payload, created_at_ms \
             FROM ranked_items \
             WHERE collection=?1 AND owner_id=?2 \
             ORDER BY rank ASC",
        )?;
        let mut rows = stmt.query(params![kind.as_str(), owner.as_str()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(RankedItem {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                item_id: row.get(2)?,
                rank: row.get(3)?,
                last_activity_at_ms: row.get(4)?,
                payload: row.get(5)?,
                created_at_ms: row.get(6)?,
            });
        }
        Ok(out)
    }

    fn create_row(
        &mut self,
        kind: CollectionKind,
        row: NewRankedItem,
    ) -> Result<RankedItem, StoreError> {
        let item = RankedItem {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: row.owner_id,
            item_id: row.item_id,
            rank: row.rank,
            last_activity_at_ms: row.last_activity_at_ms,
            payload: row.payload,
            created_at_ms: row.created_at_ms,
        };
        self.conn.execute(
            "INSERT INTO ranked_items(id, collection, owner_id, item_id, rank, last_activity_at_ms, payload, created_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                item.id,
                kind.as_str(),
                item.owner_id,
                item.item_id,
                item.rank,
                item.last_activity_at_ms,
                item.payload,
                item.created_at_ms,
            ],
        )?;
        Ok(item)
    }

    /// Two passes keep `UNIQUE(collection, owner_id, rank)` satisfied after
    /// every statement: first every moving row is parked on a distinct
    /// negative rank, then each gets its final rank.
    fn update_ranks(
        &mut self,
        kind: CollectionKind,
        changes: &[RankChange],
    ) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut stmt = self
            .conn
            .prepare_cached("UPDATE ranked_items SET rank=?3 WHERE collection=?1 AND id=?2")?;
        for (idx, change) in changes.iter().enumerate() {
            let parked = -1 - i64::try_from(idx).map_err(|_| StoreError::InvalidInput("numeric overflow"))?;
            ensure_one(stmt.execute(params![kind.as_str(), change.id, parked])?)?;
        }
        for change in changes {
            ensure_one(stmt.execute(params![kind.as_str(), change.id, change.rank])?)?;
        }
        Ok(())
    }

    fn update_activity(
        &mut self,
        kind: CollectionKind,
        id: &str,
        last_activity_at_ms: i64,
    ) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE ranked_items SET last_activity_at_ms=?3 WHERE collection=?1 AND id=?2",
            params![kind.as_str(), id, last_activity_at_ms],
        )?;
        ensure_one(updated)
    }

    fn update_payload(
        &mut self,
        kind: CollectionKind,
        id: &str,
        payload: &str,
    ) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE ranked_items SET payload=?3 WHERE collection=?1 AND id=?2",
            params![kind.as_str(), id, payload],
        )?;
        ensure_one(updated)
    }

    fn delete_row(&mut self, kind: CollectionKind, id: &str) -> Result<(), StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM ranked_items WHERE collection=?1 AND id=?2",
            params![kind.as_str(), id],
        )?;
        ensure_one(deleted)
    }

    fn delete_owner(
        &mut self,
        kind: CollectionKind,
        owner: &OwnerId,
    ) -> Result<usize, StoreError> {
        Ok(self.conn.execute(
            "DELETE FROM ranked_items WHERE collection=?1 AND owner_id=?2",
            params![kind.as_str(), owner.as_str()],
        )?)
    }
}

fn ensure_one(changed: usize) -> Result<(), StoreError> {
    if changed == 1 {
        Ok(())
    } else {
        Err(RankedError::NotFound.into())
    }
}
