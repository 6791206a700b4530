use std::{collections::HashMap, sync::Arc};

use crate::{file::BlockId, tx::lock::LockTable, Result};

#[derive(Clone, Copy, PartialEq)]
enum LockKind {
    Shared,
    Exclusive,
}

/// Per transaction view of the global [LockTable].
///
/// Remembers which locks this transaction holds so repeated requests
/// are no-ops, upgrades shared to exclusive in place, and releases
/// everything at once at commit or rollback, which is what makes the
/// protocol strict two phase.
pub struct ConcurrencyManager {
    locks: Arc<LockTable>,
    held: HashMap<BlockId, LockKind>,
}

impl ConcurrencyManager {
    pub fn new(locks: Arc<LockTable>) -> ConcurrencyManager {
        ConcurrencyManager {
            locks,
            held: HashMap::new(),
        }
    }

    pub fn shared_lock(&mut self, block: &BlockId) -> Result<()> {
        if !self.held.contains_key(block) {
            self.locks.shared_lock(block)?;
            self.held.insert(block.clone(), LockKind::Shared);
        }
        Ok(())
    }

    pub fn exclusive_lock(&mut self, block: &BlockId) -> Result<()> {
        if !self.has_exclusive_lock(block) {
            self.shared_lock(block)?;
            self.locks.exclusive_lock(block)?;
            self.held.insert(block.clone(), LockKind::Exclusive);
        }
        Ok(())
    }

    /// Release every held lock.
    pub fn release(&mut self) -> Result<()> {
        for (block, _) in self.held.drain() {
            self.locks.unlock(&block)?;
        }
        Ok(())
    }

    fn has_exclusive_lock(&self, block: &BlockId) -> bool {
        self.held.get(block) == Some(&LockKind::Exclusive)
    }
}

#[cfg(test)]
#[path = "concurrency_test.rs"]
mod concurrency_test;
