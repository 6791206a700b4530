use std::{
    collections::HashMap,
    sync::{Condvar, Mutex},
    time,
};

use crate::{err_at, file::BlockId, Result};

/// Default bound on waiting for a block lock, in milliseconds.
pub const MAX_TIME: u64 = 10_000;

/// Process wide table of block level locks.
///
/// Each entry is a counter: 0 or absent means unlocked, a positive
/// value counts shared holders, -1 marks an exclusive holder. Waiters
/// are woken by broadcast with no fairness guarantee; a wait that
/// exceeds the timeout fails with [crate::Error::LockAbort], which is
/// also the only deadlock resolution.
///
/// One instance is shared by every transaction of a database and is
/// passed around explicitly through the database handle.
pub struct LockTable {
    locks: Mutex<HashMap<BlockId, i32>>,
    cond: Condvar,
    timeout: time::Duration,
}

impl Default for LockTable {
    fn default() -> LockTable {
        LockTable::new(time::Duration::from_millis(MAX_TIME))
    }
}

impl LockTable {
    pub fn new(timeout: time::Duration) -> LockTable {
        LockTable {
            locks: Mutex::new(HashMap::new()),
            cond: Condvar::new(),
            timeout,
        }
    }

    /// Acquire a shared lock on `block`, waiting out any exclusive
    /// holder.
    pub fn shared_lock(&self, block: &BlockId) -> Result<()> {
        let deadline = time::Instant::now() + self.timeout;
        let mut locks = err_at!(Fatal, self.locks.lock())?;

        while lock_val(&locks, block) < 0 {
            let now = time::Instant::now();
            if now >= deadline {
                return err_at!(LockAbort, msg: "shared lock on {}", block);
            }
            let (guard, _) =
                err_at!(Fatal, self.cond.wait_timeout(locks, deadline - now))?;
            locks = guard;
        }

        let val = lock_val(&locks, block);
        locks.insert(block.clone(), val + 1);

        Ok(())
    }

    /// Upgrade to an exclusive lock on `block`. The caller must
    /// already hold a shared lock on it, which is never released while
    /// waiting; the wait is for the other shared holders to go away.
    pub fn exclusive_lock(&self, block: &BlockId) -> Result<()> {
        let deadline = time::Instant::now() + self.timeout;
        let mut locks = err_at!(Fatal, self.locks.lock())?;

        while lock_val(&locks, block) > 1 {
            let now = time::Instant::now();
            if now >= deadline {
                return err_at!(LockAbort, msg: "exclusive lock on {}", block);
            }
            let (guard, _) =
                err_at!(Fatal, self.cond.wait_timeout(locks, deadline - now))?;
            locks = guard;
        }

        locks.insert(block.clone(), -1);

        Ok(())
    }

    /// Give up one holding on `block`, shared or exclusive.
    pub fn unlock(&self, block: &BlockId) -> Result<()> {
        let mut locks = err_at!(Fatal, self.locks.lock())?;

        let val = lock_val(&locks, block);
        if val > 1 {
            locks.insert(block.clone(), val - 1);
        } else {
            locks.remove(block);
            self.cond.notify_all();
        }

        Ok(())
    }
}

fn lock_val(locks: &HashMap<BlockId, i32>, block: &BlockId) -> i32 {
    match locks.get(block) {
        Some(val) => *val,
        None => 0,
    }
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod lock_test;
