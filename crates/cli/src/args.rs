#![forbid(unsafe_code)]

use std::path::PathBuf;

pub(crate) const DEFAULT_STORAGE_DIR: &str = ".forumrank";

pub(crate) fn usage() -> &'static str {
    "fr_cli: inspect and maintain forum ranked lists\n\n\
USAGE:\n\
  fr_cli [--storage-dir DIR] [--config FILE] <COMMAND>\n\n\
COMMANDS:\n\
  recent touch <member> <community>\n\
  recent list <member>\n\
  recent remove <member> <community>\n\
  recent clear <member>\n\
  rules append <community> <text> [--rule-id ID]\n\
  rules list <community>\n\
  rules remove <community> <rule_id>\n\
  rules remove-rank <community> <rank>\n\
  rules reorder <community> <rule_id> <rank>\n\
  rules edit <community> <rule_id> <text>\n\
  rules clear <community>\n\n\
ENVIRONMENT:\n\
  FR_STORAGE_DIR, FR_CONFIG        defaults for --storage-dir / --config\n\
  FR_BUSY_TIMEOUT_MS, FR_MAX_ATTEMPTS, FR_RETRY_BACKOFF_MS,\n\
  FR_RECENT_COMMUNITIES_BOUND, FR_COMMUNITY_RULES_BOUND   store overrides\n\
  FR_LOG                           tracing filter (default: warn)\n"
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    RecentTouch {
        member: String,
        community: String,
    },
    RecentList {
        member: String,
    },
    RecentRemove {
        member: String,
        community: String,
    },
    RecentClear {
        member: String,
    },
    RulesAppend {
        community: String,
        text: String,
        rule_id: Option<String>,
    },
    RulesList {
        community: String,
    },
    RulesRemove {
        community: String,
        rule_id: String,
    },
    RulesRemoveRank {
        community: String,
        rank: u32,
    },
    RulesReorder {
        community: String,
        rule_id: String,
        rank: u32,
    },
    RulesEdit {
        community: String,
        rule_id: String,
        text: String,
    },
    RulesClear {
        community: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CliArgs {
    pub(crate) storage_dir: PathBuf,
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) command: Command,
}

pub(crate) fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn parse_args(
    args: Vec<String>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<CliArgs, String> {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        return Ok(CliArgs {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            config_path: None,
            command: Command::Help,
        });
    }

    let mut storage_dir: Option<PathBuf> = env("FR_STORAGE_DIR").map(PathBuf::from);
    let mut config_path: Option<PathBuf> = env("FR_CONFIG").map(PathBuf::from);
    let mut rule_id: Option<String> = None;
    let mut positional = Vec::new();

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--storage-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--storage-dir requires DIR")?;
                storage_dir = Some(PathBuf::from(v));
            }
            "--config" => {
                i += 1;
                let v = args.get(i).ok_or("--config requires FILE")?;
                config_path = Some(PathBuf::from(v));
            }
            "--rule-id" => {
                i += 1;
                let v = args.get(i).ok_or("--rule-id requires ID")?;
                rule_id = Some(v.clone());
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown flag: {other}"));
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let command = parse_command(positional, rule_id)?;
    Ok(CliArgs {
        storage_dir: storage_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
        config_path,
        command,
    })
}

fn parse_command(positional: Vec<String>, rule_id: Option<String>) -> Result<Command, String> {
    let words = positional.iter().map(String::as_str).collect::<Vec<_>>();
    if rule_id.is_some() && words.get(..2) != Some(&["rules", "append"][..]) {
        return Err("--rule-id only applies to `rules append`".to_string());
    }
    let command = match words.as_slice() {
        ["recent", "touch", member, community] => Command::RecentTouch {
            member: member.to_string(),
            community: community.to_string(),
        },
        ["recent", "list", member] => Command::RecentList {
            member: member.to_string(),
        },
        ["recent", "remove", member, community] => Command::RecentRemove {
            member: member.to_string(),
            community: community.to_string(),
        },
        ["recent", "clear", member] => Command::RecentClear {
            member: member.to_string(),
        },
        ["rules", "append", community, text] => Command::RulesAppend {
            community: community.to_string(),
            text: text.to_string(),
            rule_id,
        },
        ["rules", "list", community] => Command::RulesList {
            community: community.to_string(),
        },
        ["rules", "remove", community, rule_id] => Command::RulesRemove {
            community: community.to_string(),
            rule_id: rule_id.to_string(),
        },
        ["rules", "remove-rank", community, rank] => Command::RulesRemoveRank {
            community: community.to_string(),
            rank: parse_rank(rank)?,
        },
        ["rules", "reorder", community, rule_id, rank] => Command::RulesReorder {
            community: community.to_string(),
            rule_id: rule_id.to_string(),
            rank: parse_rank(rank)?,
        },
        ["rules", "edit", community, rule_id, text] => Command::RulesEdit {
            community: community.to_string(),
            rule_id: rule_id.to_string(),
            text: text.to_string(),
        },
        ["rules", "clear", community] => Command::RulesClear {
            community: community.to_string(),
        },
        [] => return Err("missing command".to_string()),
        _ => return Err(format!("unrecognized command: {}", words.join(" "))),
    };
    Ok(command)
}

fn parse_rank(raw: &str) -> Result<u32, String> {
    raw.parse::<u32>()
        .map_err(|_| format!("rank must be a non-negative integer, got {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parses_flags_anywhere() {
        let parsed = parse_args(
            args(&["rules", "--storage-dir", "/tmp/x", "reorder", "c1", "r1", "3"]),
            no_env,
        )
        .unwrap();
        assert_eq!(parsed.storage_dir, PathBuf::from("/tmp/x"));
        assert_eq!(
            parsed.command,
            Command::RulesReorder {
                community: "c1".to_string(),
                rule_id: "r1".to_string(),
                rank: 3
            }
        );
    }

    #[test]
    fn env_supplies_defaults_and_flags_win() {
        let env = |key: &str| match key {
            "FR_STORAGE_DIR" => Some("/from/env".to_string()),
            "FR_CONFIG" => Some("/from/env.yaml".to_string()),
            _ => None,
        };
        let parsed = parse_args(args(&["recent", "list", "m1"]), env).unwrap();
        assert_eq!(parsed.storage_dir, PathBuf::from("/from/env"));
        assert_eq!(parsed.config_path, Some(PathBuf::from("/from/env.yaml")));

        let parsed =
            parse_args(args(&["--config", "local.yaml", "recent", "list", "m1"]), env).unwrap();
        assert_eq!(parsed.config_path, Some(PathBuf::from("local.yaml")));
    }

    #[test]
    fn rule_id_only_for_append() {
        let parsed = parse_args(
            args(&["rules", "append", "c1", "Be nice", "--rule-id", "r-1"]),
            no_env,
        )
        .unwrap();
        assert_eq!(
            parsed.command,
            Command::RulesAppend {
                community: "c1".to_string(),
                text: "Be nice".to_string(),
                rule_id: Some("r-1".to_string())
            }
        );
        assert!(parse_args(args(&["rules", "list", "c1", "--rule-id", "x"]), no_env).is_err());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(args(&[]), no_env).is_err());
        assert!(parse_args(args(&["recent", "touch", "m1"]), no_env).is_err());
        assert!(parse_args(args(&["rules", "remove-rank", "c1", "two"]), no_env).is_err());
        assert!(parse_args(args(&["--verbose", "recent", "list", "m1"]), no_env).is_err());
        assert_eq!(
            parse_args(args(&["recent", "-h"]), no_env).unwrap().command,
            Command::Help
        );
    }
}
