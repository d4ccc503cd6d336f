#![forbid(unsafe_code)]

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TouchRecentCommunityRequest {
    pub member_id: String,
    pub community_id: String,
    pub now_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoveRecentCommunityRequest {
    pub member_id: String,
    pub community_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppendRuleRequest {
    pub community_id: String,
    /// Generated when absent.
    pub rule_id: Option<String>,
    pub text: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoveRuleRequest {
    pub community_id: String,
    pub rule_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoveRuleAtRankRequest {
    pub community_id: String,
    pub rank: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReorderRuleRequest {
    pub community_id: String,
    pub rule_id: String,
    pub rank: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateRuleTextRequest {
    pub community_id: String,
    pub rule_id: String,
    pub text: String,
}
