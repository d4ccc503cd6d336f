#![forbid(unsafe_code)]

use fr_storage::{
    AppendRuleRequest, SqliteStore, StoreConfig, StoreError, TouchRecentCommunityRequest,
};
use rusqlite::{Connection, params};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Barrier};

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("fr_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn touch_request(member: &str, community: &str, now_ms: i64) -> TouchRecentCommunityRequest {
    TouchRecentCommunityRequest {
        member_id: member.to_string(),
        community_id: community.to_string(),
        now_ms,
    }
}

fn assert_dense(ranks: &[u32]) {
    let expected = (1..=ranks.len() as u32).collect::<Vec<_>>();
    assert_eq!(ranks, expected.as_slice(), "ranks must be exactly 1..=count");
}

fn patient_config() -> StoreConfig {
    StoreConfig {
        busy_timeout_ms: 10_000,
        max_attempts: 20,
        ..StoreConfig::default()
    }
}

#[test]
fn concurrent_touches_fill_last_slot_exactly_once() {
    for round in 0..10 {
        let dir = temp_dir(&format!("concurrent_fill_{round}"));
        {
            let mut store = SqliteStore::open(&dir).expect("open store");
            for (now, community) in ["A", "B", "C", "D"].into_iter().enumerate() {
                store
                    .recent_communities_touch(touch_request("member-1", community, now as i64))
                    .expect("seed");
            }
        }

        let barrier = Arc::new(Barrier::new(2));
        let handles = ["X", "Y"]
            .into_iter()
            .map(|community| {
                let dir = dir.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let mut store =
                        SqliteStore::open_with_config(&dir, patient_config()).expect("open store");
                    barrier.wait();
                    store
                        .recent_communities_touch(touch_request("member-1", community, 100))
                        .expect("concurrent touch")
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            let row = handle.join().expect("thread");
            assert!(row.rank >= 1);
        }

        let mut store = SqliteStore::open(&dir).expect("reopen");
        let rows = store.recent_communities_list("member-1").expect("list");
        assert_eq!(rows.len(), 5, "round {round}: bound must be reached exactly");
        assert_dense(&rows.iter().map(|row| row.rank).collect::<Vec<_>>());
        let items = rows
            .iter()
            .map(|row| row.item_id.as_str())
            .collect::<BTreeSet<_>>();
        assert!(items.contains("X") && items.contains("Y"));
        assert_eq!(rows[4].item_id, "B", "round {round}: A was evicted, B is now last");
    }
}

#[test]
fn concurrent_mixed_operations_keep_invariants() {
    let dir = temp_dir("concurrent_mixed");
    {
        let _store = SqliteStore::open(&dir).expect("create store");
    }

    let threads = 6;
    let barrier = Arc::new(Barrier::new(threads));
    let handles = (0..threads)
        .map(|worker| {
            let dir = dir.clone();
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                let mut store =
                    SqliteStore::open_with_config(&dir, patient_config()).expect("open store");
                barrier.wait();
                for step in 0..40 {
                    let community = format!("c{}", (worker * 7 + step) % 9);
                    store
                        .recent_communities_touch(touch_request("member-1", &community, step as i64))
                        .expect("touch");
                    match store.community_rules_append(AppendRuleRequest {
                        community_id: "community-1".to_string(),
                        rule_id: None,
                        text: format!("rule from {worker}/{step}"),
                        created_at_ms: step as i64,
                    }) {
                        Ok(_) | Err(StoreError::BoundExceeded { .. }) => {}
                        Err(other) => panic!("unexpected append error: {other:?}"),
                    }
                    if step % 5 == 0 {
                        let _ = store.community_rules_remove_at_rank(
                            fr_storage::RemoveRuleAtRankRequest {
                                community_id: "community-1".to_string(),
                                rank: 1,
                            },
                        );
                    }
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().expect("worker");
    }

    let mut store = SqliteStore::open(&dir).expect("reopen");
    let recent = store.recent_communities_list("member-1").expect("recent");
    assert_eq!(recent.len(), 5);
    assert_dense(&recent.iter().map(|row| row.rank).collect::<Vec<_>>());

    let rules = store.community_rules_list("community-1").expect("rules");
    assert!(rules.len() <= 10);
    assert_dense(&rules.iter().map(|row| row.rank).collect::<Vec<_>>());
}

#[test]
fn rejected_operation_leaves_no_partial_writes() {
    let dir = temp_dir("rejected_no_partial");
    let mut store = SqliteStore::open(&dir).expect("open store");
    for n in 0..10 {
        store
            .community_rules_append(AppendRuleRequest {
                community_id: "community-1".to_string(),
                rule_id: Some(format!("r{n}")),
                text: format!("rule {n}"),
                created_at_ms: n,
            })
            .expect("append");
    }
    let before = store.community_rules_list("community-1").expect("list");

    let err = store
        .community_rules_reorder(fr_storage::ReorderRuleRequest {
            community_id: "community-1".to_string(),
            rule_id: "r3".to_string(),
            rank: 0,
        })
        .expect_err("rank 0 is invalid");
    assert_eq!(err.code(), "INVALID_RANK");
    assert_eq!(store.community_rules_list("community-1").expect("list"), before);
}

#[test]
fn held_write_lock_surfaces_contention_after_retries() {
    let dir = temp_dir("contention");
    let config = StoreConfig {
        busy_timeout_ms: 0,
        max_attempts: 3,
        retry_backoff_ms: 1,
        ..StoreConfig::default()
    };
    let mut store = SqliteStore::open_with_config(&dir, config).expect("open store");
    store
        .recent_communities_touch(touch_request("member-1", "A", 1))
        .expect("seed");

    let mut blocker = Connection::open(dir.join("forumrank.db")).expect("open blocker");
    let tx = blocker
        .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
        .expect("hold write lock");

    let err = store
        .recent_communities_touch(touch_request("member-1", "B", 2))
        .expect_err("lock is held");
    assert!(matches!(err, StoreError::Contention { attempts: 3 }));
    assert_eq!(err.code(), "CONTENTION");

    drop(tx);
    store
        .recent_communities_touch(touch_request("member-1", "B", 3))
        .expect("lock released");
    let rows = store.recent_communities_list("member-1").expect("list");
    assert_eq!(
        rows.iter().map(|row| row.item_id.as_str()).collect::<Vec<_>>(),
        vec!["B", "A"]
    );
}

#[test]
fn uncommitted_transaction_is_not_persisted_after_reopen() {
    let dir = temp_dir("uncommitted");
    {
        let _store = SqliteStore::open(&dir).expect("open store");
    }

    {
        let mut conn = Connection::open(dir.join("forumrank.db")).expect("open db");
        let tx = conn.transaction().expect("begin tx");
        tx.execute(
            "INSERT INTO ranked_items(id, collection, owner_id, item_id, rank, created_at_ms) \
             VALUES (?1, 'recent_communities', 'member-1', 'A', 1, 0)",
            params!["row-1"],
        )
        .expect("insert row");
        // Dropped without commit: rolled back.
    }

    let mut store = SqliteStore::open(&dir).expect("reopen");
    assert!(
        store
            .recent_communities_list("member-1")
            .expect("list")
            .is_empty()
    );
}

#[test]
fn schema_rejects_duplicate_ranks() {
    let dir = temp_dir("unique_rank");
    let mut store = SqliteStore::open(&dir).expect("open store");
    store
        .recent_communities_touch(touch_request("member-1", "A", 1))
        .expect("seed");

    let conn = Connection::open(dir.join("forumrank.db")).expect("open db");
    let err = conn
        .execute(
            "INSERT INTO ranked_items(id, collection, owner_id, item_id, rank, created_at_ms) \
             VALUES ('dup', 'recent_communities', 'member-1', 'B', 1, 0)",
            [],
        )
        .expect_err("rank 1 already taken");
    assert!(err.to_string().contains("UNIQUE"));
}
