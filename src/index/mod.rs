//! Module `index` implement the two index structures.
//!
//! An index maps a key value to the [Rid]s of the records holding that
//! value. Both implementations share one contract: position with
//! `before_first(key)`, step matching entries with `next`, read the
//! current [Rid], and mutate with `insert`/`delete`.
//!
//! * [HashIndex], a static hash over a fixed number of bucket tables.
//! * [BTreeIndex], a B+-tree with a directory file and a leaf file.

pub mod btree;
mod hash;
mod scans;

pub use btree::BTreeIndex;
pub use hash::{HashIndex, NUM_BUCKETS};
pub use scans::{IndexJoinScan, IndexSelectScan};

use crate::{err_at, query::Constant, record::Rid, tx::Transaction, Result};

/// The two index structures. `index_catalog` records one of these for
/// every index, as the numeric code below, and the metadata layer
/// resolves it back when the index is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexType {
    Hash,
    BTree,
}

impl IndexType {
    pub fn to_code(&self) -> i32 {
        match self {
            IndexType::Hash => 0,
            IndexType::BTree => 1,
        }
    }

    pub fn from_code(code: i32) -> Result<IndexType> {
        match code {
            0 => Ok(IndexType::Hash),
            1 => Ok(IndexType::BTree),
            _ => err_at!(FailConvert, msg: "bad index type code {}", code),
        }
    }

    /// Cost of one probe of an index of `num_blocks` blocks holding
    /// `records_per_block` entries per block.
    pub fn search_cost(&self, num_blocks: i32, records_per_block: i32) -> i32 {
        match self {
            IndexType::Hash => HashIndex::search_cost(num_blocks, records_per_block),
            IndexType::BTree => BTreeIndex::search_cost(num_blocks, records_per_block),
        }
    }
}

/// Tagged variant over the index implementations.
pub enum Index {
    Hash(HashIndex),
    BTree(BTreeIndex),
}

impl Index {
    /// Position the index before the first entry matching `key`.
    pub fn before_first(&mut self, tx: &mut Transaction, key: &Constant) -> Result<()> {
        match self {
            Index::Hash(idx) => idx.before_first(tx, key),
            Index::BTree(idx) => idx.before_first(tx, key),
        }
    }

    /// Step to the next entry matching the positioned key.
    pub fn next(&mut self, tx: &mut Transaction) -> Result<bool> {
        match self {
            Index::Hash(idx) => idx.next(tx),
            Index::BTree(idx) => idx.next(tx),
        }
    }

    /// Record identifier of the current entry.
    pub fn get_rid(&self, tx: &mut Transaction) -> Result<Rid> {
        match self {
            Index::Hash(idx) => idx.get_rid(tx),
            Index::BTree(idx) => idx.get_rid(tx),
        }
    }

    pub fn insert(
        &mut self,
        tx: &mut Transaction,
        key: &Constant,
        rid: &Rid,
    ) -> Result<()> {
        match self {
            Index::Hash(idx) => idx.insert(tx, key, rid),
            Index::BTree(idx) => idx.insert(tx, key, rid),
        }
    }

    pub fn delete(
        &mut self,
        tx: &mut Transaction,
        key: &Constant,
        rid: &Rid,
    ) -> Result<()> {
        match self {
            Index::Hash(idx) => idx.delete(tx, key, rid),
            Index::BTree(idx) => idx.delete(tx, key, rid),
        }
    }

    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        match self {
            Index::Hash(idx) => idx.close(tx),
            Index::BTree(idx) => idx.close(tx),
        }
    }
}
