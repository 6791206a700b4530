//! Module `record` implement slotted record pages and table scans.
//!
//! A table is a file of record pages. Each page holds
//! `block_size / slot_size` fixed size slots, a slot being a 4 byte
//! in-use flag followed by the record's fields laid out per [Layout].
//! [TableScan] iterates the file slot by slot and is the updatable
//! leaf every query scan bottoms out in.

use std::{fmt, result};

mod page;
mod schema;
mod scan;

pub use page::RecordPage;
pub use scan::TableScan;
pub use schema::{FieldType, Layout, Schema};

/// Identifier of a record within a table file: block number and slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rid {
    blknum: i32,
    slot: i32,
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "[{}, {}]", self.blknum, self.slot)
    }
}

impl Rid {
    pub fn new(blknum: i32, slot: i32) -> Rid {
        Rid { blknum, slot }
    }

    #[inline]
    pub fn block_number(&self) -> i32 {
        self.blknum
    }

    #[inline]
    pub fn slot(&self) -> i32 {
        self.slot
    }
}
