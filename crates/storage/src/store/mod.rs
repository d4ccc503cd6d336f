#![forbid(unsafe_code)]

mod config;
mod error;
mod recent;
mod requests;
mod rows;
mod rules;

pub use config::StoreConfig;
pub use error::StoreError;
pub use requests::*;

use fr_core::ids::{ItemId, OwnerId};
use fr_core::ranked::{CollectionKind, CollectionSpec, RankedCollectionManager};
use rows::SqlRows;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const DB_FILE_NAME: &str = "forumrank.db";
const SCHEMA_VERSION: i64 = 1;

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
    config: StoreConfig,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_config(storage_dir, StoreConfig::default())
    }

    pub fn open_with_config(
        storage_dir: impl AsRef<Path>,
        config: StoreConfig,
    ) -> Result<Self, StoreError> {
        config.validate()?;
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        install_schema(&conn)?;
        info!(path = %db_path.display(), schema_version = SCHEMA_VERSION, "opened ranked store");

        Ok(Self {
            conn,
            storage_dir,
            config,
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub(crate) fn manager(
        &self,
        kind: CollectionKind,
    ) -> Result<RankedCollectionManager, StoreError> {
        let bound = match kind {
            CollectionKind::RecentCommunities => self.config.recent_communities_bound,
            CollectionKind::CommunityRules => self.config.community_rules_bound,
        };
        let spec = CollectionSpec::try_new(kind, bound)?;
        Ok(RankedCollectionManager::new(spec))
    }

    /// Runs `op` inside one transaction and commits it.
    ///
    /// Writers begin IMMEDIATE so the database write lock is held from the
    /// first read to the commit; two operations on the same owner therefore
    /// never interleave. A busy/locked failure rolls the attempt back and
    /// replays `op` from scratch, up to `max_attempts` times. Returning early
    /// (error, panic) drops the transaction, which rolls it back.
    pub(crate) fn run<T>(
        &mut self,
        label: &'static str,
        behavior: TransactionBehavior,
        mut op: impl FnMut(&mut SqlRows<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let max_attempts = self.config.max_attempts;
        let backoff = Duration::from_millis(self.config.retry_backoff_ms);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.run_once(behavior, &mut op) {
                Err(err) if err.is_retryable() => {
                    if attempt >= max_attempts {
                        warn!(op = label, attempts = attempt, error = %err, "giving up on contended write");
                        return Err(StoreError::Contention { attempts: attempt });
                    }
                    debug!(op = label, attempt, error = %err, "write lock contended; retrying");
                    std::thread::sleep(backoff * attempt);
                }
                other => return other,
            }
        }
    }

    fn run_once<T>(
        &mut self,
        behavior: TransactionBehavior,
        op: &mut impl FnMut(&mut SqlRows<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let tx = self.conn.transaction_with_behavior(behavior)?;
        let out = {
            let mut rows = SqlRows::new(&tx);
            op(&mut rows)?
        };
        tx.commit()?;
        Ok(out)
    }

    pub(crate) fn write<T>(
        &mut self,
        label: &'static str,
        op: impl FnMut(&mut SqlRows<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.run(label, TransactionBehavior::Immediate, op)
    }

    pub(crate) fn read<T>(
        &mut self,
        label: &'static str,
        op: impl FnMut(&mut SqlRows<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.run(label, TransactionBehavior::Deferred, op)
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS store_state (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          schema_version INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ranked_items (
          id TEXT PRIMARY KEY,
          collection TEXT NOT NULL,
          owner_id TEXT NOT NULL,
          item_id TEXT NOT NULL,
          rank INTEGER NOT NULL CHECK(rank <> 0),
          last_activity_at_ms INTEGER,
          payload TEXT,
          created_at_ms INTEGER NOT NULL,
          UNIQUE(collection, owner_id, item_id),
          UNIQUE(collection, owner_id, rank)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO store_state(singleton, schema_version) VALUES (1, ?1)",
        params![SCHEMA_VERSION],
    )?;
    let version = conn
        .query_row(
            "SELECT schema_version FROM store_state WHERE singleton=1",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;

    match version {
        Some(v) if v == SCHEMA_VERSION => Ok(()),
        Some(_) => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema version mismatch",
        )),
        None => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema state row is missing",
        )),
    }
}

fn canonicalize_owner(value: &str, field: &'static str) -> Result<OwnerId, StoreError> {
    OwnerId::try_new(value).map_err(|_| StoreError::InvalidInput(field))
}

fn canonicalize_item(value: &str, field: &'static str) -> Result<ItemId, StoreError> {
    ItemId::try_new(value).map_err(|_| StoreError::InvalidInput(field))
}
