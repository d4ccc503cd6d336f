#![forbid(unsafe_code)]

use serde::Serialize;

pub const RECENT_COMMUNITIES_BOUND: u32 = 5;
pub const COMMUNITY_RULES_BOUND: u32 = 10;
pub const RULE_TEXT_MAX_CHARS: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    RecentCommunities,
    CommunityRules,
}

impl CollectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecentCommunities => "recent_communities",
            Self::CommunityRules => "community_rules",
        }
    }

    pub fn policy(self) -> RankPolicy {
        match self {
            Self::RecentCommunities => RankPolicy::MoveToFront,
            Self::CommunityRules => RankPolicy::AppendOnly,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankPolicy {
    /// Touching an item moves it to rank 1; inserting past the bound evicts the last rank.
    MoveToFront,
    /// Items are appended at the end; a full collection rejects further appends.
    AppendOnly,
}

impl RankPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MoveToFront => "move_to_front",
            Self::AppendOnly => "append_only",
        }
    }
}

/// Which collection a manager maintains and how large it may grow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectionSpec {
    kind: CollectionKind,
    bound: u32,
}

impl CollectionSpec {
    pub fn try_new(kind: CollectionKind, bound: u32) -> Result<Self, RankedError> {
        if bound == 0 {
            return Err(RankedError::InvalidBound { bound });
        }
        Ok(Self { kind, bound })
    }

    pub fn recent_communities() -> Self {
        Self {
            kind: CollectionKind::RecentCommunities,
            bound: RECENT_COMMUNITIES_BOUND,
        }
    }

    pub fn community_rules() -> Self {
        Self {
            kind: CollectionKind::CommunityRules,
            bound: COMMUNITY_RULES_BOUND,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn bound(&self) -> u32 {
        self.bound
    }

    pub fn policy(&self) -> RankPolicy {
        self.kind.policy()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankedItem {
    pub id: String,
    pub owner_id: String,
    pub item_id: String,
    pub rank: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_at_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    pub created_at_ms: i64,
}

/// A row the port is asked to create; the port assigns `id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRankedItem {
    pub owner_id: String,
    pub item_id: String,
    pub rank: u32,
    pub last_activity_at_ms: Option<i64>,
    pub payload: Option<String>,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankChange {
    pub id: String,
    pub rank: u32,
}

/// Result of a removal: the deleted row and the renumbered survivors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Removal {
    pub removed: RankedItem,
    pub items: Vec<RankedItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RankedError {
    #[error("item not found")]
    NotFound,
    #[error("item already present in collection")]
    DuplicateItem,
    #[error("collection is full (bound={bound})")]
    BoundExceeded { bound: u32 },
    #[error("rank out of range (requested={requested}, count={count})")]
    InvalidRank { requested: u32, count: u32 },
    #[error("operation not supported by {} policy", .policy.as_str())]
    PolicyMismatch { policy: RankPolicy },
    #[error("invalid payload: {0}")]
    InvalidPayload(&'static str),
    #[error("collection bound must be positive (bound={bound})")]
    InvalidBound { bound: u32 },
}
