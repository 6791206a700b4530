use log::info;
use serde::{Deserialize, Serialize};

use std::{
    path,
    sync::{atomic::AtomicI32, atomic::Ordering::SeqCst, Arc},
    time,
};

use crate::{
    buffer::{self, BufferManager},
    err_at,
    file::FileManager,
    meta::MetadataManager,
    plan::{Plan, Planner},
    tx::{lock, LockTable, Transaction},
    util,
    wal::LogManager,
    Result,
};

/// Name of the write-ahead log file within the database directory.
pub const LOG_FILE: &str = "simpledb.log";

/// Name of the persisted configuration file within the database
/// directory.
pub const CONFIG_FILE: &str = "simpledb.toml";

/// Configuration for a database instance.
///
/// Persisted as toml inside the database directory the first time the
/// database is opened; subsequent opens reuse the persisted values, so
/// a directory's block size never changes across restarts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Size of a disk block in bytes.
    pub block_size: usize,
    /// Number of frames in the buffer pool.
    pub num_buffers: usize,
    /// Bound on block-lock waits, in milliseconds.
    pub lock_timeout_ms: u64,
    /// Bound on buffer-pin waits, in milliseconds.
    pub pin_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            block_size: 400,
            num_buffers: 8,
            lock_timeout_ms: lock::MAX_TIME,
            pin_timeout_ms: buffer::MAX_TIME,
        }
    }
}

impl<'a> arbitrary::Arbitrary<'a> for Config {
    fn arbitrary(u: &mut arbitrary::Unstructured) -> arbitrary::Result<Self> {
        let block_size = *u.choose(&[120, 400, 512, 1024])?;
        let num_buffers = *u.choose(&[3, 8, 16])?;
        let lock_timeout_ms = *u.choose(&[1000, 10_000])?;
        let pin_timeout_ms = *u.choose(&[1000, 10_000])?;

        let config = Config {
            block_size,
            num_buffers,
            lock_timeout_ms,
            pin_timeout_ms,
        };
        Ok(config)
    }
}

impl Config {
    pub fn set_block_size(&mut self, block_size: usize) -> &mut Self {
        self.block_size = block_size;
        self
    }

    pub fn set_num_buffers(&mut self, num_buffers: usize) -> &mut Self {
        self.num_buffers = num_buffers;
        self
    }

    pub fn set_lock_timeout(&mut self, ms: u64) -> &mut Self {
        self.lock_timeout_ms = ms;
        self
    }

    pub fn set_pin_timeout(&mut self, ms: u64) -> &mut Self {
        self.pin_timeout_ms = ms;
        self
    }
}

/// A database instance rooted at one directory.
///
/// Owns the managers every transaction works through. [SimpleDB::new]
/// wires the storage core only, which is what most tests want;
/// [SimpleDB::open] additionally runs restart recovery, bootstraps the
/// catalogs and wires the SQL planner.
pub struct SimpleDB {
    config: Config,
    fm: Arc<FileManager>,
    lm: Arc<LogManager>,
    bm: Arc<BufferManager>,
    locks: Arc<LockTable>,
    next_txn_id: AtomicI32,
    meta: Option<Arc<MetadataManager>>,
    planner: Option<Planner>,
}

impl SimpleDB {
    /// Wire the storage core for `db_dir`: file, log and buffer
    /// managers and the lock table. No recovery, no catalogs.
    pub fn new(db_dir: &path::Path, config: Config) -> Result<SimpleDB> {
        let fm = Arc::new(FileManager::new(db_dir, config.block_size)?);
        let lm = Arc::new(LogManager::new(Arc::clone(&fm), LOG_FILE)?);
        let bm = Arc::new(BufferManager::new(
            Arc::clone(&fm),
            Arc::clone(&lm),
            config.num_buffers,
            time::Duration::from_millis(config.pin_timeout_ms),
        ));
        let locks = Arc::new(LockTable::new(time::Duration::from_millis(
            config.lock_timeout_ms,
        )));

        Ok(SimpleDB {
            config,
            fm,
            lm,
            bm,
            locks,
            next_txn_id: AtomicI32::new(1),
            meta: None,
            planner: None,
        })
    }

    /// Open the database at `db_dir` for SQL use: load or persist the
    /// configuration, run restart recovery, bootstrap the catalogs and
    /// wire the planner.
    pub fn open(db_dir: &path::Path) -> Result<SimpleDB> {
        let config_loc = db_dir.join(CONFIG_FILE);
        let config: Config = if config_loc.exists() {
            util::load_toml(&config_loc)?
        } else {
            Config::default()
        };

        let mut db = Self::new(db_dir, config)?;
        util::save_toml(&config_loc, &db.config)?;

        let is_new = db.fm.is_new();
        let mut tx = db.new_tx()?;
        if is_new {
            info!(target: "simpdb", "creating new database");
        } else {
            info!(target: "simpdb", "recovering existing database");
            tx.recover()?;
        }
        let meta = Arc::new(MetadataManager::new(is_new, &mut tx)?);
        tx.commit()?;

        db.planner = Some(Planner::new(Arc::clone(&meta)));
        db.meta = Some(meta);

        Ok(db)
    }

    /// Start a fresh transaction.
    pub fn new_tx(&self) -> Result<Transaction> {
        let txn_id = self.next_txn_id.fetch_add(1, SeqCst);
        Transaction::new(
            Arc::clone(&self.fm),
            Arc::clone(&self.lm),
            Arc::clone(&self.bm),
            Arc::clone(&self.locks),
            txn_id,
        )
    }

    /// Plan the query `statement` inside `tx`.
    pub fn create_query_plan(&self, statement: &str, tx: &mut Transaction) -> Result<Plan> {
        self.planner()?.create_query_plan(statement, tx)
    }

    /// Execute the update `statement` inside `tx`.
    pub fn execute_update(&self, statement: &str, tx: &mut Transaction) -> Result<i32> {
        self.planner()?.execute_update(statement, tx)
    }

    pub fn planner(&self) -> Result<&Planner> {
        match &self.planner {
            Some(planner) => Ok(planner),
            None => err_at!(Fatal, msg: "database opened without planner"),
        }
    }

    pub fn metadata(&self) -> Result<&Arc<MetadataManager>> {
        match &self.meta {
            Some(meta) => Ok(meta),
            None => err_at!(Fatal, msg: "database opened without catalogs"),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn file_manager(&self) -> &Arc<FileManager> {
        &self.fm
    }

    pub fn log_manager(&self) -> &Arc<LogManager> {
        &self.lm
    }

    pub fn buffer_manager(&self) -> &Arc<BufferManager> {
        &self.bm
    }

    pub fn lock_table(&self) -> &Arc<LockTable> {
        &self.locks
    }
}

#[cfg(test)]
#[path = "db_test.rs"]
mod db_test;
