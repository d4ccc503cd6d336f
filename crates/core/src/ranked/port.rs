#![forbid(unsafe_code)]

use super::{CollectionKind, NewRankedItem, RankChange, RankedError, RankedItem};
use crate::ids::OwnerId;

/// Row store the manager drives.
///
/// Every call made by one manager operation belongs to a single unit of work
/// opened by the caller; the port never commits on its own. Implementations
/// must apply `update_ranks` as one batch: a rank that is only free after the
/// whole batch lands must not trip a uniqueness check halfway through.
pub trait RankedRows {
    type Error: From<RankedError>;

    /// All rows of the owner's collection, rank ascending.
    fn list_by_owner(
        &mut self,
        kind: CollectionKind,
        owner: &OwnerId,
    ) -> Result<Vec<RankedItem>, Self::Error>;

    fn create_row(
        &mut self,
        kind: CollectionKind,
        row: NewRankedItem,
    ) -> Result<RankedItem, Self::Error>;

    fn update_ranks(
        &mut self,
        kind: CollectionKind,
        changes: &[RankChange],
    ) -> Result<(), Self::Error>;

    fn update_activity(
        &mut self,
        kind: CollectionKind,
        id: &str,
        last_activity_at_ms: i64,
    ) -> Result<(), Self::Error>;

    fn update_payload(
        &mut self,
        kind: CollectionKind,
        id: &str,
        payload: &str,
    ) -> Result<(), Self::Error>;

    fn delete_row(&mut self, kind: CollectionKind, id: &str) -> Result<(), Self::Error>;

    /// Removes the whole collection; returns how many rows were deleted.
    fn delete_owner(&mut self, kind: CollectionKind, owner: &OwnerId)
    -> Result<usize, Self::Error>;
}
