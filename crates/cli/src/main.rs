#![forbid(unsafe_code)]

mod args;
mod render;

use args::{CliArgs, Command, env_var, parse_args, usage};
use fr_storage::{
    AppendRuleRequest, RemoveRecentCommunityRequest, RemoveRuleAtRankRequest, RemoveRuleRequest,
    ReorderRuleRequest, SqliteStore, StoreConfig, StoreError, TouchRecentCommunityRequest,
    UpdateRuleTextRequest,
};
use serde_json::Value;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: CliArgs) -> Result<Value, StoreError> {
    let config = StoreConfig::load(cli.config_path.as_deref())?;
    let mut store = SqliteStore::open_with_config(&cli.storage_dir, config)?;

    let value = match cli.command {
        Command::Help => Value::String(usage().to_string()),
        Command::RecentTouch { member, community } => {
            render::item(&store.recent_communities_touch(TouchRecentCommunityRequest {
                member_id: member,
                community_id: community,
                now_ms: render::now_ms(),
            })?)
        }
        Command::RecentList { member } => render::items(&store.recent_communities_list(&member)?),
        Command::RecentRemove { member, community } => {
            render::removal(&store.recent_communities_remove(RemoveRecentCommunityRequest {
                member_id: member,
                community_id: community,
            })?)
        }
        Command::RecentClear { member } => {
            render::cleared(store.recent_communities_clear(&member)?)
        }
        Command::RulesAppend {
            community,
            text,
            rule_id,
        } => render::item(&store.community_rules_append(AppendRuleRequest {
            community_id: community,
            rule_id,
            text,
            created_at_ms: render::now_ms(),
        })?),
        Command::RulesList { community } => {
            render::items(&store.community_rules_list(&community)?)
        }
        Command::RulesRemove { community, rule_id } => {
            render::removal(&store.community_rules_remove(RemoveRuleRequest {
                community_id: community,
                rule_id,
            })?)
        }
        Command::RulesRemoveRank { community, rank } => {
            render::removal(&store.community_rules_remove_at_rank(RemoveRuleAtRankRequest {
                community_id: community,
                rank,
            })?)
        }
        Command::RulesReorder {
            community,
            rule_id,
            rank,
        } => render::items(&store.community_rules_reorder(ReorderRuleRequest {
            community_id: community,
            rule_id,
            rank,
        })?),
        Command::RulesEdit {
            community,
            rule_id,
            text,
        } => render::item(&store.community_rules_update_text(UpdateRuleTextRequest {
            community_id: community,
            rule_id,
            text,
        })?),
        Command::RulesClear { community } => {
            render::cleared(store.community_rules_clear(&community)?)
        }
    };
    Ok(value)
}

fn main() -> ExitCode {
    init_tracing();

    let cli = match parse_args(std::env::args().skip(1).collect(), env_var) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}\n\n{}", usage());
            return ExitCode::from(2);
        }
    };
    if cli.command == Command::Help {
        print!("{}", usage());
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(code = err.code(), error = %err, "command failed");
            println!("{}", render::error(&err));
            ExitCode::FAILURE
        }
    }
}
