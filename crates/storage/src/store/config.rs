#![forbid(unsafe_code)]

use super::StoreError;
use fr_core::ranked::{COMMUNITY_RULES_BOUND, RECENT_COMMUNITIES_BOUND};
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_BUSY_TIMEOUT_MS: &str = "FR_BUSY_TIMEOUT_MS";
const ENV_MAX_ATTEMPTS: &str = "FR_MAX_ATTEMPTS";
const ENV_RETRY_BACKOFF_MS: &str = "FR_RETRY_BACKOFF_MS";
const ENV_RECENT_COMMUNITIES_BOUND: &str = "FR_RECENT_COMMUNITIES_BOUND";
const ENV_COMMUNITY_RULES_BOUND: &str = "FR_COMMUNITY_RULES_BOUND";

/// Tuning for a `SqliteStore`.
///
/// Sources, lowest precedence first: built-in defaults, an optional YAML
/// file, then `FR_*` environment variables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// How long SQLite waits on a held write lock before reporting busy.
    pub busy_timeout_ms: u64,
    /// Total tries for one operation when the lock stays contended.
    pub max_attempts: u32,
    /// Sleep before retry `n` is `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
    pub recent_communities_bound: u32,
    pub community_rules_bound: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            max_attempts: 5,
            retry_backoff_ms: 20,
            recent_communities_bound: RECENT_COMMUNITIES_BOUND,
            community_rules_bound: COMMUNITY_RULES_BOUND,
        }
    }
}

impl StoreConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, StoreError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|err| StoreError::Config(err.to_string()))
    }

    /// Defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, StoreError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|err| {
                    StoreError::Config(format!("read {}: {err}", path.display()))
                })?;
                Self::from_yaml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), StoreError> {
        if let Some(value) = parse_override(&lookup, ENV_BUSY_TIMEOUT_MS)? {
            self.busy_timeout_ms = value;
        }
        if let Some(value) = parse_override(&lookup, ENV_MAX_ATTEMPTS)? {
            self.max_attempts = value;
        }
        if let Some(value) = parse_override(&lookup, ENV_RETRY_BACKOFF_MS)? {
            self.retry_backoff_ms = value;
        }
        if let Some(value) = parse_override(&lookup, ENV_RECENT_COMMUNITIES_BOUND)? {
            self.recent_communities_bound = value;
        }
        if let Some(value) = parse_override(&lookup, ENV_COMMUNITY_RULES_BOUND)? {
            self.community_rules_bound = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.max_attempts == 0 {
            return Err(StoreError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.recent_communities_bound == 0 {
            return Err(StoreError::Config(
                "recent_communities_bound must be at least 1".to_string(),
            ));
        }
        if self.community_rules_bound == 0 {
            return Err(StoreError::Config(
                "community_rules_bound must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| StoreError::Config(format!("{key} must be a non-negative integer")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let config = StoreConfig::from_yaml_str("community_rules_bound: 3\n").unwrap();
        assert_eq!(config.community_rules_bound, 3);
        assert_eq!(config.recent_communities_bound, RECENT_COMMUNITIES_BOUND);
        assert_eq!(config.max_attempts, 5);
    }

    #[test]
    fn yaml_rejects_unknown_keys() {
        let err = StoreConfig::from_yaml_str("bound: 3\n").unwrap_err();
        assert_eq!(err.code(), "CONFIG");
    }

    #[test]
    fn env_overrides_win_and_are_validated() {
        let env = HashMap::from([
            (ENV_MAX_ATTEMPTS, "9"),
            (ENV_RECENT_COMMUNITIES_BOUND, " 7 "),
            (ENV_RETRY_BACKOFF_MS, ""),
        ]);
        let mut config = StoreConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();
        assert_eq!(config.max_attempts, 9);
        assert_eq!(config.recent_communities_bound, 7);
        assert_eq!(config.retry_backoff_ms, 20);

        let mut config = StoreConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_COMMUNITY_RULES_BOUND).then(|| "ten".to_string()))
            .unwrap_err();
        assert!(matches!(err, StoreError::Config(message) if message.contains(ENV_COMMUNITY_RULES_BOUND)));
    }

    #[test]
    fn zero_bounds_fail_validation() {
        let config = StoreConfig {
            recent_communities_bound: 0,
            ..StoreConfig::default()
        };
        assert!(config.validate().is_err());
        let config = StoreConfig {
            max_attempts: 0,
            ..StoreConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(StoreConfig::default().validate().is_ok());
    }
}
