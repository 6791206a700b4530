//! Module `wal` implement the append-only write-ahead log.
//!
//! The log is one file of block sized pages. Within a block, records
//! are packed from the high end downward, each preceded by its 4 byte
//! length, and the first 4 bytes of the block hold the `boundary`, the
//! offset of the most recently written record. [LogManager] mirrors
//! the tail block in memory and assigns a monotonically increasing LSN
//! to every appended record. [LogIter] walks records newest first,
//! which is the order undo recovery wants them in.

use log::debug;

use std::{
    convert::TryFrom,
    sync::{Arc, Mutex},
};

use crate::{
    err_at,
    file::{BlockId, FileManager, Page},
    Result,
};

struct InnerLog {
    page: Page,
    current_block: BlockId,
    latest_lsn: i32,
    last_saved_lsn: i32,
}

/// Append and flush log records for one log file.
///
/// Appends are cheap, they go to the in-memory tail page. The page is
/// written to disk when it fills up, when a caller forces an LSN with
/// [LogManager::flush], or when an iterator is taken.
pub struct LogManager {
    fm: Arc<FileManager>,
    log_file: String,
    inner: Mutex<InnerLog>,
}

impl LogManager {
    pub fn new(fm: Arc<FileManager>, log_file: &str) -> Result<LogManager> {
        let mut page = Page::new(fm.block_size());

        let log_size = fm.length(log_file)?;
        let current_block = if log_size == 0 {
            Self::append_new_block(&fm, log_file, &mut page)?
        } else {
            let block = BlockId::new(log_file, log_size - 1);
            fm.read(&block, &mut page)?;
            block
        };

        let inner = InnerLog {
            page,
            current_block,
            latest_lsn: 0,
            last_saved_lsn: 0,
        };

        let val = LogManager {
            fm,
            log_file: log_file.to_string(),
            inner: Mutex::new(inner),
        };

        Ok(val)
    }

    /// Append `rec` to the log and return its LSN. The record is not
    /// necessarily on disk afterwards, call [LogManager::flush] with
    /// the returned LSN for durability.
    pub fn append(&self, rec: &[u8]) -> Result<i32> {
        let mut inner = err_at!(Fatal, self.inner.lock())?;

        let needed = rec.len() + 4;
        if needed + 4 > self.fm.block_size() {
            return err_at!(
                InvalidInput, msg: "log record {} exceeds block size", rec.len()
            );
        }

        let mut boundary = usize::try_from(inner.page.get_int(0)?).ok();
        let fits = match boundary {
            Some(b) => b >= needed && b - needed >= 4,
            None => false,
        };
        if !fits {
            // tail block is full, flush it and start a fresh one.
            self.do_flush(&mut inner)?;
            inner.current_block =
                Self::append_new_block(&self.fm, &self.log_file, &mut inner.page)?;
            boundary = Some(self.fm.block_size());
            debug!(
                target: "wal   ",
                "log rotated to {}", inner.current_block
            );
        }

        let boundary = match boundary {
            Some(b) => b,
            None => return err_at!(Fatal, msg: "log boundary corrupt"),
        };

        let rec_pos = boundary - needed;
        inner.page.set_bytes(rec_pos, rec)?;
        let n = err_at!(FailConvert, i32::try_from(rec_pos))?;
        inner.page.set_int(0, n)?;
        inner.latest_lsn += 1;

        Ok(inner.latest_lsn)
    }

    /// Ensure the log is on disk at least up to `lsn`.
    pub fn flush(&self, lsn: i32) -> Result<()> {
        let mut inner = err_at!(Fatal, self.inner.lock())?;
        if lsn > inner.last_saved_lsn {
            self.do_flush(&mut inner)?;
        }
        Ok(())
    }

    /// Iterate over flushed log records, newest first. Forces the tail
    /// block to disk before the iterator is constructed.
    pub fn iter(&self) -> Result<LogIter> {
        let mut inner = err_at!(Fatal, self.inner.lock())?;
        self.do_flush(&mut inner)?;
        LogIter::new(Arc::clone(&self.fm), inner.current_block.clone())
    }

    fn do_flush(&self, inner: &mut InnerLog) -> Result<()> {
        self.fm.write(&inner.current_block, &inner.page)?;
        inner.last_saved_lsn = inner.latest_lsn;
        Ok(())
    }

    fn append_new_block(
        fm: &FileManager,
        log_file: &str,
        page: &mut Page,
    ) -> Result<BlockId> {
        let block = fm.append(log_file)?;
        let boundary = err_at!(FailConvert, i32::try_from(fm.block_size()))?;
        *page = Page::new(fm.block_size());
        page.set_int(0, boundary)?;
        fm.write(&block, page)?;
        Ok(block)
    }
}

/// Iterator over log records, newest first. Finite and not restartable.
pub struct LogIter {
    fm: Arc<FileManager>,
    block: BlockId,
    page: Page,
    current_pos: usize,
}

impl LogIter {
    fn new(fm: Arc<FileManager>, block: BlockId) -> Result<LogIter> {
        let mut val = LogIter {
            page: Page::new(fm.block_size()),
            fm,
            block: block.clone(),
            current_pos: 0,
        };
        val.move_to_block(&block)?;
        Ok(val)
    }

    fn move_to_block(&mut self, block: &BlockId) -> Result<()> {
        self.fm.read(block, &mut self.page)?;
        self.block = block.clone();
        self.current_pos = err_at!(FailConvert, usize::try_from(self.page.get_int(0)?))?;
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.current_pos < self.fm.block_size() || self.block.to_number() > 0
    }

    fn next_rec(&mut self) -> Result<Vec<u8>> {
        if self.current_pos == self.fm.block_size() {
            let block =
                BlockId::new(self.block.as_file_name(), self.block.to_number() - 1);
            self.move_to_block(&block)?;
        }
        let rec = self.page.get_bytes(self.current_pos)?.to_vec();
        self.current_pos += 4 + rec.len();
        Ok(rec)
    }
}

impl Iterator for LogIter {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            Some(self.next_rec())
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "wal_test.rs"]
mod wal_test;
