use std::convert::TryFrom;

use crate::{
    err_at,
    file::BlockId,
    record::{FieldType, Layout},
    tx::Transaction,
    Result,
};

const EMPTY: i32 = 0;
const USED: i32 = 1;

/// Slotted page access to one block of a table file.
///
/// The constructor pins the block in the calling transaction;
/// dropping the page does not unpin, callers unpin through the
/// transaction when the scan moves on.
pub struct RecordPage {
    block: BlockId,
    layout: Layout,
}

impl RecordPage {
    pub fn new(tx: &mut Transaction, block: BlockId, layout: Layout) -> Result<RecordPage> {
        tx.pin(&block)?;
        Ok(RecordPage { block, layout })
    }

    pub fn block(&self) -> &BlockId {
        &self.block
    }

    pub fn get_int(&self, tx: &mut Transaction, slot: i32, field: &str) -> Result<i32> {
        let pos = self.field_pos(slot, field)?;
        tx.get_int(&self.block, pos)
    }

    pub fn get_string(
        &self,
        tx: &mut Transaction,
        slot: i32,
        field: &str,
    ) -> Result<String> {
        let pos = self.field_pos(slot, field)?;
        tx.get_string(&self.block, pos)
    }

    pub fn set_int(
        &self,
        tx: &mut Transaction,
        slot: i32,
        field: &str,
        val: i32,
    ) -> Result<()> {
        let pos = self.field_pos(slot, field)?;
        tx.set_int(&self.block, pos, val, true)
    }

    pub fn set_string(
        &self,
        tx: &mut Transaction,
        slot: i32,
        field: &str,
        val: &str,
    ) -> Result<()> {
        let max = self.layout.schema().length(field)?;
        if val.len() > max {
            return err_at!(
                InvalidInput, msg: "string {} over field {} max {}", val.len(), field, max
            );
        }
        let pos = self.field_pos(slot, field)?;
        tx.set_string(&self.block, pos, val, true)
    }

    /// Mark the slot empty.
    pub fn delete(&self, tx: &mut Transaction, slot: i32) -> Result<()> {
        self.set_flag(tx, slot, EMPTY)
    }

    /// Zero every slot: empty flags and default field values. Not
    /// logged, formatting happens before a block is visible to anyone.
    pub fn format(&self, tx: &mut Transaction) -> Result<()> {
        let mut slot = 0;
        while self.is_valid_slot(tx, slot) {
            tx.set_int(&self.block, self.slot_pos(slot), EMPTY, false)?;
            let schema = self.layout.schema();
            for field in schema.fields() {
                let pos = self.field_pos(slot, field)?;
                match schema.field_type(field)? {
                    FieldType::Integer => tx.set_int(&self.block, pos, 0, false)?,
                    FieldType::Varchar => tx.set_string(&self.block, pos, "", false)?,
                }
            }
            slot += 1;
        }
        Ok(())
    }

    /// Next used slot after `slot`, or -1.
    pub fn next_after(&self, tx: &mut Transaction, slot: i32) -> Result<i32> {
        self.search_after(tx, slot, USED)
    }

    /// Claim the first empty slot after `slot`, or -1 when the page is
    /// full.
    pub fn insert_after(&self, tx: &mut Transaction, slot: i32) -> Result<i32> {
        let new_slot = self.search_after(tx, slot, EMPTY)?;
        if new_slot >= 0 {
            self.set_flag(tx, new_slot, USED)?;
        }
        Ok(new_slot)
    }

    fn set_flag(&self, tx: &mut Transaction, slot: i32, flag: i32) -> Result<()> {
        tx.set_int(&self.block, self.slot_pos(slot), flag, true)
    }

    fn search_after(&self, tx: &mut Transaction, slot: i32, flag: i32) -> Result<i32> {
        let mut slot = slot + 1;
        while self.is_valid_slot(tx, slot) {
            if tx.get_int(&self.block, self.slot_pos(slot))? == flag {
                return Ok(slot);
            }
            slot += 1;
        }
        Ok(-1)
    }

    fn is_valid_slot(&self, tx: &Transaction, slot: i32) -> bool {
        self.slot_pos(slot + 1) <= tx.block_size()
    }

    fn slot_pos(&self, slot: i32) -> usize {
        let slot = usize::try_from(slot).unwrap_or(0);
        slot * self.layout.slot_size()
    }

    fn field_pos(&self, slot: i32, field: &str) -> Result<usize> {
        Ok(self.slot_pos(slot) + self.layout.offset(field)?)
    }
}

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;
