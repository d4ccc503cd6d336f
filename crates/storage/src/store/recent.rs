#![forbid(unsafe_code)]

use super::*;
use fr_core::ranked::{RankedItem, Removal};

impl SqliteStore {
    /// Records that a member visited a community: it becomes rank 1 of the
    /// member's sidebar, evicting the least recent entry when full.
    pub fn recent_communities_touch(
        &mut self,
        request: TouchRecentCommunityRequest,
    ) -> Result<RankedItem, StoreError> {
        let member = canonicalize_owner(&request.member_id, "invalid member_id")?;
        let community = canonicalize_item(&request.community_id, "invalid community_id")?;
        let manager = self.manager(CollectionKind::RecentCommunities)?;

        let item = self.write("recent_communities_touch", |rows| {
            manager.touch_or_insert(rows, &member, &community, request.now_ms)
        })?;
        debug!(
            member = member.as_str(),
            community = community.as_str(),
            "recent community touched"
        );
        Ok(item)
    }

    pub fn recent_communities_list(
        &mut self,
        member_id: &str,
    ) -> Result<Vec<RankedItem>, StoreError> {
        let member = canonicalize_owner(member_id, "invalid member_id")?;
        let manager = self.manager(CollectionKind::RecentCommunities)?;
        self.read("recent_communities_list", |rows| manager.list(rows, &member))
    }

    pub fn recent_communities_remove(
        &mut self,
        request: RemoveRecentCommunityRequest,
    ) -> Result<Removal, StoreError> {
        let member = canonicalize_owner(&request.member_id, "invalid member_id")?;
        let community = canonicalize_item(&request.community_id, "invalid community_id")?;
        let manager = self.manager(CollectionKind::RecentCommunities)?;

        let removal = self.write("recent_communities_remove", |rows| {
            manager.remove(rows, &member, &community)
        })?;
        debug!(
            member = member.as_str(),
            community = community.as_str(),
            remaining = removal.items.len(),
            "recent community removed"
        );
        Ok(removal)
    }

    pub fn recent_communities_clear(&mut self, member_id: &str) -> Result<usize, StoreError> {
        let member = canonicalize_owner(member_id, "invalid member_id")?;
        let manager = self.manager(CollectionKind::RecentCommunities)?;
        let cleared = self.write("recent_communities_clear", |rows| manager.clear(rows, &member))?;
        debug!(member = member.as_str(), cleared, "recent communities cleared");
        Ok(cleared)
    }
}
