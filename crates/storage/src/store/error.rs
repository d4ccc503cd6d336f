#![forbid(unsafe_code)]

use fr_core::RankedError;
use rusqlite::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("config: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("not found")]
    NotFound,
    #[error("collection is full (bound={bound})")]
    BoundExceeded { bound: u32 },
    #[error("rank out of range (requested={requested}, count={count})")]
    InvalidRank { requested: u32, count: u32 },
    #[error("write contention persisted after {attempts} attempts")]
    Contention { attempts: u32 },
}

impl StoreError {
    /// Stable machine-readable code for adapters.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO",
            Self::Sql(_) => "SQL",
            Self::Config(_) => "CONFIG",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::BoundExceeded { .. } => "BOUND_EXCEEDED",
            Self::InvalidRank { .. } => "INVALID_RANK",
            Self::Contention { .. } => "CONTENTION",
        }
    }

    /// A lock conflict with another writer; the whole operation may be replayed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Sql(rusqlite::Error::SqliteFailure(code, _)) => matches!(
                code.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

impl From<RankedError> for StoreError {
    fn from(value: RankedError) -> Self {
        match value {
            RankedError::NotFound => Self::NotFound,
            RankedError::BoundExceeded { bound } => Self::BoundExceeded { bound },
            RankedError::InvalidRank { requested, count } => {
                Self::InvalidRank { requested, count }
            }
            RankedError::DuplicateItem => Self::InvalidInput("item already present in collection"),
            RankedError::PolicyMismatch { .. } => {
                Self::InvalidInput("operation not supported by collection policy")
            }
            RankedError::InvalidPayload(message) => Self::InvalidInput(message),
            RankedError::InvalidBound { .. } => {
                Self::InvalidInput("collection bound must be positive")
            }
        }
    }
}
