//! Module `buffer` implement the buffer pool.
//!
//! A [Buffer] is one page frame: a page, the block currently bound to
//! it, a pin count, and dirty-tracking metadata. [BufferManager] owns
//! a fixed number of frames and maps blocks onto them on demand.
//! Before a dirty frame is written back or rebound, the log is flushed
//! up to the frame's LSN, that single rule is the write-ahead-log
//! guarantee everything above relies on.

use log::warn;

use std::{
    sync::{Arc, Condvar, Mutex},
    time,
};

use crate::{
    err_at,
    file::{BlockId, FileManager, Page},
    wal::LogManager,
    Result,
};

/// Default bound on waiting for a free frame, in milliseconds.
pub const MAX_TIME: u64 = 10_000;

/// Shared handle to a pool frame.
pub type Frame = Arc<Mutex<Buffer>>;

/// One page frame in the buffer pool.
pub struct Buffer {
    fm: Arc<FileManager>,
    lm: Arc<LogManager>,
    page: Page,
    block: Option<BlockId>,
    pins: i32,
    txn: i32,
    lsn: i32,
}

impl Buffer {
    fn new(fm: Arc<FileManager>, lm: Arc<LogManager>) -> Buffer {
        let page = Page::new(fm.block_size());
        Buffer {
            fm,
            lm,
            page,
            block: None,
            pins: 0,
            txn: -1,
            lsn: -1,
        }
    }

    pub fn contents(&self) -> &Page {
        &self.page
    }

    pub fn contents_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn block(&self) -> Option<&BlockId> {
        self.block.as_ref()
    }

    /// Record that `txn` modified this frame's page. A negative `lsn`
    /// means the modification was not logged (page formatting, undo).
    pub fn set_modified(&mut self, txn: i32, lsn: i32) {
        self.txn = txn;
        if lsn >= 0 {
            self.lsn = lsn;
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.pins > 0
    }

    pub fn modifying_txn(&self) -> i32 {
        self.txn
    }

    // Write the page back if dirty, honoring WAL ordering.
    fn flush(&mut self) -> Result<()> {
        if self.txn >= 0 {
            self.lm.flush(self.lsn)?;
            if let Some(block) = &self.block {
                self.fm.write(block, &self.page)?;
            }
            self.txn = -1;
        }
        Ok(())
    }

    // Bind this frame to `block`, flushing the previous binding first.
    fn assign_to_block(&mut self, block: &BlockId) -> Result<()> {
        self.flush()?;
        self.fm.read(block, &mut self.page)?;
        self.block = Some(block.clone());
        self.pins = 0;
        Ok(())
    }

    fn pin(&mut self) {
        self.pins += 1;
    }

    fn unpin(&mut self) {
        self.pins -= 1;
    }
}

/// Fixed pool of page frames shared by every transaction.
///
/// Pinning blocks until a frame is free, bounded by `timeout`; an
/// exhausted wait is a [crate::Error::BufferAbort] and the caller is
/// expected to roll back.
pub struct BufferManager {
    pool: Vec<Frame>,
    avail: Mutex<usize>,
    cond: Condvar,
    timeout: time::Duration,
}

impl BufferManager {
    pub fn new(
        fm: Arc<FileManager>,
        lm: Arc<LogManager>,
        num_buffs: usize,
        timeout: time::Duration,
    ) -> BufferManager {
        let mut pool = Vec::with_capacity(num_buffs);
        for _i in 0..num_buffs {
            let buffer = Buffer::new(Arc::clone(&fm), Arc::clone(&lm));
            pool.push(Arc::new(Mutex::new(buffer)));
        }

        BufferManager {
            pool,
            avail: Mutex::new(num_buffs),
            cond: Condvar::new(),
            timeout,
        }
    }

    /// Number of unpinned frames.
    pub fn available(&self) -> usize {
        match self.avail.lock() {
            Ok(avail) => *avail,
            Err(_) => 0,
        }
    }

    /// Flush every dirty frame modified by `txn`.
    pub fn flush_all(&self, txn: i32) -> Result<()> {
        let _avail = err_at!(Fatal, self.avail.lock())?;
        for frame in self.pool.iter() {
            let mut buffer = err_at!(Fatal, frame.lock())?;
            if buffer.modifying_txn() == txn {
                buffer.flush()?;
            }
        }
        Ok(())
    }

    /// Pin `block` into a frame, waiting up to the configured timeout
    /// for a frame to become free.
    pub fn pin(&self, block: &BlockId) -> Result<Frame> {
        let deadline = time::Instant::now() + self.timeout;
        let mut avail = err_at!(Fatal, self.avail.lock())?;

        loop {
            if let Some(frame) = self.try_to_pin(block, &mut avail)? {
                break Ok(frame);
            }
            let now = time::Instant::now();
            if now >= deadline {
                warn!(target: "buffer", "pin timed out on {}", block);
                break err_at!(BufferAbort, msg: "no frame for {}", block);
            }
            let (guard, _) =
                err_at!(Fatal, self.cond.wait_timeout(avail, deadline - now))?;
            avail = guard;
        }
    }

    /// Release one pin on `frame`. The frame becomes replaceable when
    /// its pin count drops to zero.
    pub fn unpin(&self, frame: &Frame) -> Result<()> {
        let mut avail = err_at!(Fatal, self.avail.lock())?;
        let mut buffer = err_at!(Fatal, frame.lock())?;
        buffer.unpin();
        if !buffer.is_pinned() {
            *avail += 1;
            self.cond.notify_all();
        }
        Ok(())
    }

    // Runs under the pool mutex. Find the block's existing frame, else
    // rebind the first unpinned frame, else give up for this round.
    fn try_to_pin(&self, block: &BlockId, avail: &mut usize) -> Result<Option<Frame>> {
        let frame = match self.find_existing(block)? {
            Some(frame) => Some(frame),
            None => match self.choose_unpinned()? {
                Some(frame) => {
                    let mut buffer = err_at!(Fatal, frame.lock())?;
                    buffer.assign_to_block(block)?;
                    drop(buffer);
                    Some(frame)
                }
                None => None,
            },
        };

        match frame {
            Some(frame) => {
                let mut buffer = err_at!(Fatal, frame.lock())?;
                if !buffer.is_pinned() {
                    *avail -= 1;
                }
                buffer.pin();
                drop(buffer);
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }

    fn find_existing(&self, block: &BlockId) -> Result<Option<Frame>> {
        for frame in self.pool.iter() {
            let buffer = err_at!(Fatal, frame.lock())?;
            if buffer.block() == Some(block) {
                drop(buffer);
                return Ok(Some(Arc::clone(frame)));
            }
        }
        Ok(None)
    }

    fn choose_unpinned(&self) -> Result<Option<Frame>> {
        for frame in self.pool.iter() {
            let buffer = err_at!(Fatal, frame.lock())?;
            if !buffer.is_pinned() {
                drop(buffer);
                return Ok(Some(Arc::clone(frame)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod buffer_test;
