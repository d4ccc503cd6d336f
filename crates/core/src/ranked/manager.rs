#![forbid(unsafe_code)]

use super::{
    CollectionSpec, NewRankedItem, RULE_TEXT_MAX_CHARS, RankChange, RankPolicy, RankedError,
    RankedItem, RankedRows, Removal,
};
use crate::ids::{ItemId, OwnerId};

/// Maintains a dense `1..=count` rank ordering over one collection kind.
///
/// The manager holds no row state. Each operation reads the owner's rows once
/// through the port, computes every write up front, rejects invalid requests
/// before the first write, and then issues the writes. Atomicity and
/// isolation come from the unit of work the caller wraps around the port.
#[derive(Clone, Copy, Debug)]
pub struct RankedCollectionManager {
    spec: CollectionSpec,
}

impl RankedCollectionManager {
    pub fn new(spec: CollectionSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    pub fn list<R: RankedRows>(
        &self,
        rows: &mut R,
        owner: &OwnerId,
    ) -> Result<Vec<RankedItem>, R::Error> {
        rows.list_by_owner(self.spec.kind(), owner)
    }

    /// Moves `item` to rank 1, inserting it (and evicting the last rank when
    /// full) if the owner has not seen it yet.
    pub fn touch_or_insert<R: RankedRows>(
        &self,
        rows: &mut R,
        owner: &OwnerId,
        item: &ItemId,
        now_ms: i64,
    ) -> Result<RankedItem, R::Error> {
        self.require_policy(RankPolicy::MoveToFront)?;
        let kind = self.spec.kind();
        let mut items = rows.list_by_owner(kind, owner)?;

        if let Some(pos) = items.iter().position(|row| row.item_id == item.as_str()) {
            let touched = items.remove(pos);
            items.insert(0, touched);
            let changes = assign_ranks(&mut items, 1);
            rows.update_ranks(kind, &changes)?;
            rows.update_activity(kind, &items[0].id, now_ms)?;

            let mut touched = items.swap_remove(0);
            touched.last_activity_at_ms = Some(now_ms);
            return Ok(touched);
        }

        let keep = usize::try_from(self.spec.bound() - 1).unwrap_or(usize::MAX);
        if items.len() > keep {
            for evicted in items.split_off(keep) {
                rows.delete_row(kind, &evicted.id)?;
            }
        }

        let changes = assign_ranks(&mut items, 2);
        rows.update_ranks(kind, &changes)?;
        rows.create_row(
            kind,
            NewRankedItem {
                owner_id: owner.as_str().to_string(),
                item_id: item.as_str().to_string(),
                rank: 1,
                last_activity_at_ms: Some(now_ms),
                payload: None,
                created_at_ms: now_ms,
            },
        )
    }

    /// Places a new item after the current last rank. Never renumbers and
    /// never evicts.
    pub fn append<R: RankedRows>(
        &self,
        rows: &mut R,
        owner: &OwnerId,
        item: &ItemId,
        payload: &str,
        now_ms: i64,
    ) -> Result<RankedItem, R::Error> {
        self.require_policy(RankPolicy::AppendOnly)?;
        let payload = normalize_payload(payload)?;
        let kind = self.spec.kind();
        let items = rows.list_by_owner(kind, owner)?;

        let count = count_of(&items);
        if count >= self.spec.bound() {
            return Err(RankedError::BoundExceeded {
                bound: self.spec.bound(),
            }
            .into());
        }
        if items.iter().any(|row| row.item_id == item.as_str()) {
            return Err(RankedError::DuplicateItem.into());
        }

        rows.create_row(
            kind,
            NewRankedItem {
                owner_id: owner.as_str().to_string(),
                item_id: item.as_str().to_string(),
                rank: count + 1,
                last_activity_at_ms: None,
                payload: Some(payload),
                created_at_ms: now_ms,
            },
        )
    }

    pub fn remove<R: RankedRows>(
        &self,
        rows: &mut R,
        owner: &OwnerId,
        item: &ItemId,
    ) -> Result<Removal, R::Error> {
        let kind = self.spec.kind();
        let items = rows.list_by_owner(kind, owner)?;
        let pos = items
            .iter()
            .position(|row| row.item_id == item.as_str())
            .ok_or(RankedError::NotFound)?;
        remove_at(rows, self, items, pos)
    }

    pub fn remove_at_rank<R: RankedRows>(
        &self,
        rows: &mut R,
        owner: &OwnerId,
        rank: u32,
    ) -> Result<Removal, R::Error> {
        let kind = self.spec.kind();
        let items = rows.list_by_owner(kind, owner)?;
        let pos = items
            .iter()
            .position(|row| row.rank == rank)
            .ok_or(RankedError::NotFound)?;
        remove_at(rows, self, items, pos)
    }

    /// Moves `item` to `new_rank`; rows strictly between the old and the new
    /// rank shift by one toward the vacated slot. Returns the whole collection.
    pub fn reorder<R: RankedRows>(
        &self,
        rows: &mut R,
        owner: &OwnerId,
        item: &ItemId,
        new_rank: u32,
    ) -> Result<Vec<RankedItem>, R::Error> {
        let kind = self.spec.kind();
        let mut items = rows.list_by_owner(kind, owner)?;

        let count = count_of(&items);
        if new_rank == 0 || new_rank > count {
            return Err(RankedError::InvalidRank {
                requested: new_rank,
                count,
            }
            .into());
        }
        let pos = items
            .iter()
            .position(|row| row.item_id == item.as_str())
            .ok_or(RankedError::NotFound)?;

        let moved = items.remove(pos);
        let target = usize::try_from(new_rank - 1).unwrap_or(usize::MAX);
        items.insert(target, moved);
        let changes = assign_ranks(&mut items, 1);
        rows.update_ranks(kind, &changes)?;
        Ok(items)
    }

    pub fn update_payload<R: RankedRows>(
        &self,
        rows: &mut R,
        owner: &OwnerId,
        item: &ItemId,
        payload: &str,
    ) -> Result<RankedItem, R::Error> {
        self.require_policy(RankPolicy::AppendOnly)?;
        let payload = normalize_payload(payload)?;
        let kind = self.spec.kind();
        let items = rows.list_by_owner(kind, owner)?;
        let mut row = items
            .into_iter()
            .find(|row| row.item_id == item.as_str())
            .ok_or(RankedError::NotFound)?;

        rows.update_payload(kind, &row.id, &payload)?;
        row.payload = Some(payload);
        Ok(row)
    }

    pub fn clear<R: RankedRows>(&self, rows: &mut R, owner: &OwnerId) -> Result<usize, R::Error> {
        rows.delete_owner(self.spec.kind(), owner)
    }

    fn require_policy(&self, policy: RankPolicy) -> Result<(), RankedError> {
        if self.spec.policy() == policy {
            Ok(())
        } else {
            Err(RankedError::PolicyMismatch {
                policy: self.spec.policy(),
            })
        }
    }
}

fn remove_at<R: RankedRows>(
    rows: &mut R,
    manager: &RankedCollectionManager,
    mut items: Vec<RankedItem>,
    pos: usize,
) -> Result<Removal, R::Error> {
    let kind = manager.spec.kind();
    let removed = items.remove(pos);
    rows.delete_row(kind, &removed.id)?;

    let changes = assign_ranks(&mut items, 1);
    rows.update_ranks(kind, &changes)?;
    Ok(Removal { removed, items })
}

/// Renumbers `items` in their current order starting at `first_rank` and
/// returns only the rows whose rank actually changed.
pub(crate) fn assign_ranks(items: &mut [RankedItem], first_rank: u32) -> Vec<RankChange> {
    let mut changes = Vec::new();
    let mut rank = first_rank;
    for row in items.iter_mut() {
        if row.rank != rank {
            row.rank = rank;
            changes.push(RankChange {
                id: row.id.clone(),
                rank,
            });
        }
        rank = rank.saturating_add(1);
    }
    changes
}

fn count_of(items: &[RankedItem]) -> u32 {
    u32::try_from(items.len()).unwrap_or(u32::MAX)
}

fn normalize_payload(payload: &str) -> Result<String, RankedError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(RankedError::InvalidPayload("text must not be empty"));
    }
    if payload.chars().count() > RULE_TEXT_MAX_CHARS {
        return Err(RankedError::InvalidPayload("text is too long"));
    }
    Ok(payload.to_string())
}
