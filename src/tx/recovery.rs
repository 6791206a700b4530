use log::info;

use std::{
    collections::HashSet,
    fmt, result,
    sync::Arc,
};

use crate::{
    buffer::{Buffer, BufferManager},
    err_at,
    file::{BlockId, Page},
    tx::Transaction,
    wal::LogManager,
    Result,
};

/// Undo log records, one per mutation plus transaction lifecycle
/// markers. Stored in the write-ahead log, decoded newest first during
/// rollback and restart recovery.
#[derive(Clone, Debug, PartialEq)]
pub enum LogRecord {
    Checkpoint,
    Start { txn: i32 },
    Commit { txn: i32 },
    Rollback { txn: i32 },
    SetInt { txn: i32, block: BlockId, offset: usize, val: i32 },
    SetString { txn: i32, block: BlockId, offset: usize, val: String },
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use LogRecord::*;

        match self {
            Checkpoint => write!(f, "<CHECKPOINT>"),
            Start { txn } => write!(f, "<START {}>", txn),
            Commit { txn } => write!(f, "<COMMIT {}>", txn),
            Rollback { txn } => write!(f, "<ROLLBACK {}>", txn),
            SetInt { txn, block, offset, val } => {
                write!(f, "<SETINT {} {} {} {}>", txn, block, offset, val)
            }
            SetString { txn, block, offset, val } => {
                write!(f, "<SETSTRING {} {} {} {}>", txn, block, offset, val)
            }
        }
    }
}

impl LogRecord {
    const CHECKPOINT: i32 = 0;
    const START: i32 = 1;
    const COMMIT: i32 = 2;
    const ROLLBACK: i32 = 3;
    const SETINT: i32 = 4;
    const SETSTRING: i32 = 5;

    /// Transaction carried by this record, -1 for checkpoints.
    pub fn txn(&self) -> i32 {
        use LogRecord::*;

        match self {
            Checkpoint => -1,
            Start { txn } => *txn,
            Commit { txn } => *txn,
            Rollback { txn } => *txn,
            SetInt { txn, .. } => *txn,
            SetString { txn, .. } => *txn,
        }
    }

    /// Reverse the mutation encoded by this record, with logging
    /// suppressed. Only SETINT and SETSTRING records do anything.
    pub fn undo(&self, tx: &mut Transaction) -> Result<()> {
        match self {
            LogRecord::SetInt { block, offset, val, .. } => {
                tx.pin(block)?;
                tx.set_int(block, *offset, *val, false)?;
                tx.unpin(block)
            }
            LogRecord::SetString { block, offset, val, .. } => {
                tx.pin(block)?;
                tx.set_string(block, *offset, val, false)?;
                tx.unpin(block)
            }
            _ => Ok(()),
        }
    }

    /// Decode a record from bytes returned by the log iterator.
    pub fn decode(bytes: Vec<u8>) -> Result<LogRecord> {
        let page = Page::from(bytes);
        let op = page.get_int(0)?;
        let val = match op {
            Self::CHECKPOINT => LogRecord::Checkpoint,
            Self::START => LogRecord::Start { txn: page.get_int(4)? },
            Self::COMMIT => LogRecord::Commit { txn: page.get_int(4)? },
            Self::ROLLBACK => LogRecord::Rollback { txn: page.get_int(4)? },
            Self::SETINT => {
                let (txn, block, offset, pos) = Self::decode_update(&page)?;
                let val = page.get_int(pos)?;
                LogRecord::SetInt { txn, block, offset, val }
            }
            Self::SETSTRING => {
                let (txn, block, offset, pos) = Self::decode_update(&page)?;
                let val = page.get_string(pos)?;
                LogRecord::SetString { txn, block, offset, val }
            }
            op => return err_at!(Fatal, msg: "bad log record tag {}", op),
        };
        Ok(val)
    }

    /// Append this record to the log, return its LSN.
    pub fn append(&self, lm: &LogManager) -> Result<i32> {
        let bytes = self.encode()?;
        lm.append(&bytes)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let val = match self {
            LogRecord::Checkpoint => {
                let mut page = Page::new(4);
                page.set_int(0, Self::CHECKPOINT)?;
                page
            }
            LogRecord::Start { txn } => Self::encode_marker(Self::START, *txn)?,
            LogRecord::Commit { txn } => Self::encode_marker(Self::COMMIT, *txn)?,
            LogRecord::Rollback { txn } => Self::encode_marker(Self::ROLLBACK, *txn)?,
            LogRecord::SetInt { txn, block, offset, val } => {
                let (mut page, pos) = Self::encode_update(
                    Self::SETINT,
                    *txn,
                    block,
                    *offset,
                    4,
                )?;
                page.set_int(pos, *val)?;
                page
            }
            LogRecord::SetString { txn, block, offset, val } => {
                let (mut page, pos) = Self::encode_update(
                    Self::SETSTRING,
                    *txn,
                    block,
                    *offset,
                    Page::str_len(val),
                )?;
                page.set_string(pos, val)?;
                page
            }
        };

        Ok(val.as_bytes().to_vec())
    }

    fn encode_marker(op: i32, txn: i32) -> Result<Page> {
        let mut page = Page::new(8);
        page.set_int(0, op)?;
        page.set_int(4, txn)?;
        Ok(page)
    }

    // common prefix of SETINT/SETSTRING: op, txn, file name, block
    // number, offset. Returns the page and the value position.
    fn encode_update(
        op: i32,
        txn: i32,
        block: &BlockId,
        offset: usize,
        val_len: usize,
    ) -> Result<(Page, usize)> {
        use std::convert::TryFrom;

        let file_pos = 8;
        let blk_pos = file_pos + Page::str_len(block.as_file_name());
        let offset_pos = blk_pos + 4;
        let val_pos = offset_pos + 4;

        let mut page = Page::new(val_pos + val_len);
        page.set_int(0, op)?;
        page.set_int(4, txn)?;
        page.set_string(file_pos, block.as_file_name())?;
        page.set_int(blk_pos, block.to_number())?;
        page.set_int(offset_pos, err_at!(FailConvert, i32::try_from(offset))?)?;

        Ok((page, val_pos))
    }

    fn decode_update(page: &Page) -> Result<(i32, BlockId, usize, usize)> {
        use std::convert::TryFrom;

        let txn = page.get_int(4)?;
        let file_name = page.get_string(8)?;
        let blk_pos = 8 + Page::str_len(&file_name);
        let offset_pos = blk_pos + 4;
        let val_pos = offset_pos + 4;

        let block = BlockId::new(&file_name, page.get_int(blk_pos)?);
        let offset =
            err_at!(FailConvert, usize::try_from(page.get_int(offset_pos)?))?;

        Ok((txn, block, offset, val_pos))
    }
}

/// Per transaction undo-only recovery.
///
/// Writes the transaction's lifecycle and undo records, and drives
/// rollback and restart recovery by walking the log newest first.
/// Dirty buffers are always flushed before the finishing record goes
/// out, which is why a redo phase is unnecessary.
#[derive(Clone)]
pub struct RecoveryManager {
    lm: Arc<LogManager>,
    bm: Arc<BufferManager>,
    txn_id: i32,
}

impl RecoveryManager {
    /// Create the manager for transaction `txn_id`, writing its START
    /// record.
    pub fn new(
        lm: Arc<LogManager>,
        bm: Arc<BufferManager>,
        txn_id: i32,
    ) -> Result<RecoveryManager> {
        (LogRecord::Start { txn: txn_id }).append(&lm)?;
        Ok(RecoveryManager { lm, bm, txn_id })
    }

    /// Commit: flush this transaction's buffers, then force the COMMIT
    /// record to disk.
    pub fn commit(&self) -> Result<()> {
        self.bm.flush_all(self.txn_id)?;
        let lsn = (LogRecord::Commit { txn: self.txn_id }).append(&self.lm)?;
        self.lm.flush(lsn)
    }

    /// Roll back `tx` by undoing its updates newest first, then force
    /// the ROLLBACK record to disk.
    pub fn rollback(&self, tx: &mut Transaction) -> Result<()> {
        self.do_rollback(tx)?;
        self.bm.flush_all(self.txn_id)?;
        let lsn = (LogRecord::Rollback { txn: self.txn_id }).append(&self.lm)?;
        self.lm.flush(lsn)
    }

    /// Restart recovery: undo every update of every unfinished
    /// transaction, then write a quiescent checkpoint. Called once at
    /// startup before any other transaction runs.
    pub fn recover(&self, tx: &mut Transaction) -> Result<()> {
        self.do_recover(tx)?;
        self.bm.flush_all(self.txn_id)?;
        let lsn = LogRecord::Checkpoint.append(&self.lm)?;
        self.lm.flush(lsn)?;
        info!(target: "recvry", "restart recovery complete");
        Ok(())
    }

    /// Write the undo record for an int update about to happen at
    /// `offset` of `buffer`, capturing the current value.
    pub fn set_int(&self, buffer: &Buffer, offset: usize) -> Result<i32> {
        let val = buffer.contents().get_int(offset)?;
        let block = match buffer.block() {
            Some(block) => block.clone(),
            None => return err_at!(Fatal, msg: "log update for unassigned buffer"),
        };
        let rec = LogRecord::SetInt { txn: self.txn_id, block, offset, val };
        rec.append(&self.lm)
    }

    /// Write the undo record for a string update about to happen at
    /// `offset` of `buffer`, capturing the current value.
    pub fn set_string(&self, buffer: &Buffer, offset: usize) -> Result<i32> {
        let val = buffer.contents().get_string(offset)?;
        let block = match buffer.block() {
            Some(block) => block.clone(),
            None => return err_at!(Fatal, msg: "log update for unassigned buffer"),
        };
        let rec = LogRecord::SetString { txn: self.txn_id, block, offset, val };
        rec.append(&self.lm)
    }

    fn do_rollback(&self, tx: &mut Transaction) -> Result<()> {
        for item in self.lm.iter()? {
            let rec = LogRecord::decode(item?)?;
            if rec.txn() == self.txn_id {
                if let LogRecord::Start { .. } = rec {
                    return Ok(());
                }
                rec.undo(tx)?;
            }
        }
        Ok(())
    }

    fn do_recover(&self, tx: &mut Transaction) -> Result<()> {
        let mut finished: HashSet<i32> = HashSet::new();
        for item in self.lm.iter()? {
            let rec = LogRecord::decode(item?)?;
            match rec {
                LogRecord::Checkpoint => return Ok(()),
                LogRecord::Commit { txn } | LogRecord::Rollback { txn } => {
                    finished.insert(txn);
                }
                rec if !finished.contains(&rec.txn()) => rec.undo(tx)?,
                _ => (),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "recovery_test.rs"]
mod recovery_test;
