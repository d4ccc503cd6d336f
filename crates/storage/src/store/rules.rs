#![forbid(unsafe_code)]

use super::*;
use fr_core::ranked::{RankedItem, Removal};

impl SqliteStore {
    /// Adds a rule after the community's last rule. A full rule list is
    /// rejected with `BoundExceeded`; nothing is evicted.
    pub fn community_rules_append(
        &mut self,
        request: AppendRuleRequest,
    ) -> Result<RankedItem, StoreError> {
        let community = canonicalize_owner(&request.community_id, "invalid community_id")?;
        let rule_id = match request.rule_id.as_deref() {
            Some(rule_id) => canonicalize_item(rule_id, "invalid rule_id")?,
            None => canonicalize_item(&new_rule_id(), "invalid rule_id")?,
        };
        let manager = self.manager(CollectionKind::CommunityRules)?;

        let rule = self.write("community_rules_append", |rows| {
            manager.append(
                rows,
                &community,
                &rule_id,
                &request.text,
                request.created_at_ms,
            )
        })?;
        debug!(
            community = community.as_str(),
            rule = rule.item_id.as_str(),
            rank = rule.rank,
            "rule appended"
        );
        Ok(rule)
    }

    pub fn community_rules_list(
        &mut self,
        community_id: &str,
    ) -> Result<Vec<RankedItem>, StoreError> {
        let community = canonicalize_owner(community_id, "invalid community_id")?;
        let manager = self.manager(CollectionKind::CommunityRules)?;
        self.read("community_rules_list", |rows| manager.list(rows, &community))
    }

    pub fn community_rules_remove(
        &mut self,
        request: RemoveRuleRequest,
    ) -> Result<Removal, StoreError> {
        let community = canonicalize_owner(&request.community_id, "invalid community_id")?;
        let rule_id = canonicalize_item(&request.rule_id, "invalid rule_id")?;
        let manager = self.manager(CollectionKind::CommunityRules)?;

        let removal = self.write("community_rules_remove", |rows| {
            manager.remove(rows, &community, &rule_id)
        })?;
        debug!(
            community = community.as_str(),
            rule = rule_id.as_str(),
            rank = removal.removed.rank,
            "rule removed"
        );
        Ok(removal)
    }

    pub fn community_rules_remove_at_rank(
        &mut self,
        request: RemoveRuleAtRankRequest,
    ) -> Result<Removal, StoreError> {
        let community = canonicalize_owner(&request.community_id, "invalid community_id")?;
        let manager = self.manager(CollectionKind::CommunityRules)?;

        let removal = self.write("community_rules_remove_at_rank", |rows| {
            manager.remove_at_rank(rows, &community, request.rank)
        })?;
        debug!(
            community = community.as_str(),
            rule = removal.removed.item_id.as_str(),
            rank = request.rank,
            "rule removed by rank"
        );
        Ok(removal)
    }

    pub fn community_rules_reorder(
        &mut self,
        request: ReorderRuleRequest,
    ) -> Result<Vec<RankedItem>, StoreError> {
        let community = canonicalize_owner(&request.community_id, "invalid community_id")?;
        let rule_id = canonicalize_item(&request.rule_id, "invalid rule_id")?;
        let manager = self.manager(CollectionKind::CommunityRules)?;

        let rules = self.write("community_rules_reorder", |rows| {
            manager.reorder(rows, &community, &rule_id, request.rank)
        })?;
        debug!(
            community = community.as_str(),
            rule = rule_id.as_str(),
            rank = request.rank,
            "rule reordered"
        );
        Ok(rules)
    }

    pub fn community_rules_update_text(
        &mut self,
        request: UpdateRuleTextRequest,
    ) -> Result<RankedItem, StoreError> {
        let community = canonicalize_owner(&request.community_id, "invalid community_id")?;
        let rule_id = canonicalize_item(&request.rule_id, "invalid rule_id")?;
        let manager = self.manager(CollectionKind::CommunityRules)?;

        self.write("community_rules_update_text", |rows| {
            manager.update_payload(rows, &community, &rule_id, &request.text)
        })
    }

    pub fn community_rules_clear(&mut self, community_id: &str) -> Result<usize, StoreError> {
        let community = canonicalize_owner(community_id, "invalid community_id")?;
        let manager = self.manager(CollectionKind::CommunityRules)?;
        let cleared = self.write("community_rules_clear", |rows| manager.clear(rows, &community))?;
        debug!(community = community.as_str(), cleared, "rules cleared");
        Ok(cleared)
    }
}

fn new_rule_id() -> String {
    format!("rule-{}", uuid::Uuid::new_v4().simple())
}
