//! Module `tx` implement transactions over the storage core.
//!
//! A [Transaction] pins blocks through the buffer pool, takes block
//! level locks through the shared [lock::LockTable], and records every
//! logged mutation's old value in the write-ahead log before touching
//! the page. Locks follow strict two phase locking: everything is
//! released only at commit or rollback. A transaction is the sole
//! recovery site; when an operation fails with
//! [crate::Error::LockAbort] or [crate::Error::BufferAbort] the caller
//! is expected to call [Transaction::rollback].

use log::info;

use std::{collections::HashMap, sync::Arc};

pub mod concurrency;
pub mod lock;
pub mod recovery;

pub use lock::LockTable;

use crate::{
    buffer::{BufferManager, Frame},
    err_at,
    file::{BlockId, FileManager},
    tx::{concurrency::ConcurrencyManager, recovery::RecoveryManager},
    wal::LogManager,
    Result,
};

/// A database transaction.
///
/// Reads imply shared locks, writes imply exclusive locks, and
/// [Transaction::size] / [Transaction::append] serialize on a
/// synthetic end-of-file block so that concurrent readers never see a
/// file grow under them.
pub struct Transaction {
    txn_id: i32,
    fm: Arc<FileManager>,
    bm: Arc<BufferManager>,
    concurrency: ConcurrencyManager,
    recovery: RecoveryManager,
    buffers: BufferList,
}

impl Transaction {
    /// Start a new transaction, writing its START record to the log.
    pub fn new(
        fm: Arc<FileManager>,
        lm: Arc<LogManager>,
        bm: Arc<BufferManager>,
        locks: Arc<LockTable>,
        txn_id: i32,
    ) -> Result<Transaction> {
        let recovery = RecoveryManager::new(lm, Arc::clone(&bm), txn_id)?;
        let val = Transaction {
            txn_id,
            fm,
            bm: Arc::clone(&bm),
            concurrency: ConcurrencyManager::new(locks),
            recovery,
            buffers: BufferList::new(bm),
        };
        Ok(val)
    }

    #[inline]
    pub fn id(&self) -> i32 {
        self.txn_id
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.fm.block_size()
    }

    pub fn available_buffers(&self) -> usize {
        self.bm.available()
    }

    /// Pin `block` for this transaction. A block may be pinned several
    /// times by the same transaction; each pin needs a matching unpin.
    pub fn pin(&mut self, block: &BlockId) -> Result<()> {
        self.buffers.pin(block)
    }

    pub fn unpin(&mut self, block: &BlockId) -> Result<()> {
        self.buffers.unpin(block)
    }

    /// Read the int at `offset` of `block`, taking a shared lock. The
    /// block must have been pinned by this transaction.
    pub fn get_int(&mut self, block: &BlockId, offset: usize) -> Result<i32> {
        self.concurrency.shared_lock(block)?;
        let frame = self.frame_for(block)?;
        let buffer = err_at!(Fatal, frame.lock())?;
        buffer.contents().get_int(offset)
    }

    /// Read the string at `offset` of `block`, taking a shared lock.
    pub fn get_string(&mut self, block: &BlockId, offset: usize) -> Result<String> {
        self.concurrency.shared_lock(block)?;
        let frame = self.frame_for(block)?;
        let buffer = err_at!(Fatal, frame.lock())?;
        buffer.contents().get_string(offset)
    }

    /// Write `val` at `offset` of `block`, taking an exclusive lock.
    /// With `ok_to_log` the current value is first captured in a
    /// SETINT undo record; formatting and undo writes pass false.
    pub fn set_int(
        &mut self,
        block: &BlockId,
        offset: usize,
        val: i32,
        ok_to_log: bool,
    ) -> Result<()> {
        self.concurrency.exclusive_lock(block)?;
        let frame = self.frame_for(block)?;
        let mut buffer = err_at!(Fatal, frame.lock())?;
        let lsn = if ok_to_log {
            self.recovery.set_int(&buffer, offset)?
        } else {
            -1
        };
        buffer.contents_mut().set_int(offset, val)?;
        buffer.set_modified(self.txn_id, lsn);
        Ok(())
    }

    /// Write `val` at `offset` of `block`, taking an exclusive lock.
    /// With `ok_to_log` the current value is first captured in a
    /// SETSTRING undo record.
    pub fn set_string(
        &mut self,
        block: &BlockId,
        offset: usize,
        val: &str,
        ok_to_log: bool,
    ) -> Result<()> {
        self.concurrency.exclusive_lock(block)?;
        let frame = self.frame_for(block)?;
        let mut buffer = err_at!(Fatal, frame.lock())?;
        let lsn = if ok_to_log {
            self.recovery.set_string(&buffer, offset)?
        } else {
            -1
        };
        buffer.contents_mut().set_string(offset, val)?;
        buffer.set_modified(self.txn_id, lsn);
        Ok(())
    }

    /// Number of blocks in `file_name`, under a shared lock on the
    /// file's end-of-file block.
    pub fn size(&mut self, file_name: &str) -> Result<i32> {
        let eof = BlockId::eof(file_name);
        self.concurrency.shared_lock(&eof)?;
        self.fm.length(file_name)
    }

    /// Extend `file_name` by one block, under an exclusive lock on the
    /// file's end-of-file block.
    pub fn append(&mut self, file_name: &str) -> Result<BlockId> {
        let eof = BlockId::eof(file_name);
        self.concurrency.exclusive_lock(&eof)?;
        self.fm.append(file_name)
    }

    /// Commit: make this transaction durable, then release locks and
    /// buffers.
    pub fn commit(&mut self) -> Result<()> {
        self.recovery.commit()?;
        info!(target: "txn   ", "transaction {} committed", self.txn_id);
        self.concurrency.release()?;
        self.buffers.unpin_all()
    }

    /// Roll back every change made by this transaction, then release
    /// locks and buffers.
    pub fn rollback(&mut self) -> Result<()> {
        let recovery = self.recovery.clone();
        recovery.rollback(self)?;
        info!(target: "txn   ", "transaction {} rolled back", self.txn_id);
        self.concurrency.release()?;
        self.buffers.unpin_all()
    }

    /// Run restart recovery. Must be invoked on a fresh transaction at
    /// startup, before any other transaction runs.
    pub fn recover(&mut self) -> Result<()> {
        self.bm.flush_all(self.txn_id)?;
        let recovery = self.recovery.clone();
        recovery.recover(self)
    }

    fn frame_for(&self, block: &BlockId) -> Result<Frame> {
        match self.buffers.get(block) {
            Some(frame) => Ok(frame),
            None => err_at!(Fatal, msg: "block {} used without pinning", block),
        }
    }
}

// Frames pinned by one transaction, with per block pin counts so the
// same block can be pinned more than once.
struct BufferList {
    bm: Arc<BufferManager>,
    buffers: HashMap<BlockId, (Frame, usize)>,
}

impl BufferList {
    fn new(bm: Arc<BufferManager>) -> BufferList {
        BufferList {
            bm,
            buffers: HashMap::new(),
        }
    }

    fn get(&self, block: &BlockId) -> Option<Frame> {
        self.buffers.get(block).map(|(frame, _)| Arc::clone(frame))
    }

    fn pin(&mut self, block: &BlockId) -> Result<()> {
        let frame = self.bm.pin(block)?;
        let entry = self
            .buffers
            .entry(block.clone())
            .or_insert_with(|| (frame, 0));
        entry.1 += 1;
        Ok(())
    }

    fn unpin(&mut self, block: &BlockId) -> Result<()> {
        match self.buffers.get_mut(block) {
            Some((frame, count)) => {
                let frame = Arc::clone(frame);
                *count -= 1;
                if *count == 0 {
                    self.buffers.remove(block);
                }
                self.bm.unpin(&frame)
            }
            None => err_at!(Fatal, msg: "unpin of unpinned block {}", block),
        }
    }

    fn unpin_all(&mut self) -> Result<()> {
        for (_, (frame, count)) in self.buffers.drain() {
            for _ in 0..count {
                self.bm.unpin(&frame)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
