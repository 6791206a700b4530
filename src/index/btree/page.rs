use std::convert::TryFrom;

use crate::{
    err_at,
    file::BlockId,
    query::Constant,
    record::{FieldType, Layout, Rid},
    tx::Transaction,
    Result,
};

/// Common structure of B-tree directory and leaf blocks.
///
/// The first int of the block is the `flag`: for a leaf, -1 means no
/// overflow and a non-negative value points at the overflow block; for
/// a directory it is the tree level, 0 sitting immediately above the
/// leaves. The second int is the record count. Records follow, sorted
/// by key, fixed size per the layout.
pub struct BTPage {
    block: Option<BlockId>,
    layout: Layout,
}

impl BTPage {
    /// Pin `block` in `tx` and wrap it.
    pub fn new(tx: &mut Transaction, block: BlockId, layout: Layout) -> Result<BTPage> {
        tx.pin(&block)?;
        Ok(BTPage {
            block: Some(block),
            layout,
        })
    }

    /// Position where a record with `key` should go, minus one.
    pub fn find_slot_before(
        &self,
        tx: &mut Transaction,
        key: &Constant,
    ) -> Result<i32> {
        let mut slot = 0;
        while slot < self.get_num_recs(tx)? && self.get_key(tx, slot)? < *key {
            slot += 1;
        }
        Ok(slot - 1)
    }

    /// Unpin the underlying block.
    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        if let Some(block) = self.block.take() {
            tx.unpin(&block)?;
        }
        Ok(())
    }

    /// Whether one more record would overflow the block.
    pub fn is_full(&self, tx: &mut Transaction) -> Result<bool> {
        let next = self.slot_pos(self.get_num_recs(tx)? + 1)?;
        Ok(next >= tx.block_size())
    }

    /// Split at `split_pos`: records from there on move to a freshly
    /// appended block carrying `flag`.
    pub fn split(
        &self,
        tx: &mut Transaction,
        split_pos: i32,
        flag: i32,
    ) -> Result<BlockId> {
        let new_block = self.append_new(tx, flag)?;
        let mut new_page = BTPage::new(tx, new_block.clone(), self.layout.clone())?;
        self.transfer_records(tx, split_pos, &new_page)?;
        new_page.set_flag(tx, flag)?;
        new_page.close(tx)?;
        Ok(new_block)
    }

    pub fn get_key(&self, tx: &mut Transaction, slot: i32) -> Result<Constant> {
        self.get_val(tx, slot, "key")
    }

    pub fn get_flag(&self, tx: &mut Transaction) -> Result<i32> {
        tx.get_int(self.block()?, 0)
    }

    pub fn set_flag(&self, tx: &mut Transaction, val: i32) -> Result<()> {
        let block = self.block()?.clone();
        tx.set_int(&block, 0, val, true)
    }

    /// Append a formatted block with `flag` to this page's file.
    pub fn append_new(&self, tx: &mut Transaction, flag: i32) -> Result<BlockId> {
        let block = tx.append(self.block()?.as_file_name())?;
        tx.pin(&block)?;
        self.format(tx, &block, flag)?;
        tx.unpin(&block)?;
        Ok(block)
    }

    /// Zero-initialize `block`: flag, record count and default valued
    /// slots. Not logged.
    pub fn format(&self, tx: &mut Transaction, block: &BlockId, flag: i32) -> Result<()> {
        tx.set_int(block, 0, flag, false)?;
        tx.set_int(block, 4, 0, false)?;
        let record_size = self.layout.slot_size();
        let mut pos = 8;
        while pos + record_size <= tx.block_size() {
            self.make_default_record(tx, block, pos)?;
            pos += record_size;
        }
        Ok(())
    }

    // directory access

    pub fn get_child_num(&self, tx: &mut Transaction, slot: i32) -> Result<i32> {
        self.get_int(tx, slot, "block")
    }

    pub fn insert_dir(
        &self,
        tx: &mut Transaction,
        slot: i32,
        key: &Constant,
        blknum: i32,
    ) -> Result<()> {
        self.insert(tx, slot)?;
        self.set_val(tx, slot, "key", key)?;
        self.set_int(tx, slot, "block", blknum)
    }

    // leaf access

    pub fn get_rid(&self, tx: &mut Transaction, slot: i32) -> Result<Rid> {
        let blknum = self.get_int(tx, slot, "block")?;
        let id = self.get_int(tx, slot, "id")?;
        Ok(Rid::new(blknum, id))
    }

    pub fn insert_leaf(
        &self,
        tx: &mut Transaction,
        slot: i32,
        key: &Constant,
        rid: &Rid,
    ) -> Result<()> {
        self.insert(tx, slot)?;
        self.set_val(tx, slot, "key", key)?;
        self.set_int(tx, slot, "block", rid.block_number())?;
        self.set_int(tx, slot, "id", rid.slot())
    }

    /// Remove the record at `slot`, shifting the tail down.
    pub fn delete(&self, tx: &mut Transaction, slot: i32) -> Result<()> {
        let n = self.get_num_recs(tx)?;
        let mut i = slot + 1;
        while i < n {
            self.copy_record(tx, i, i - 1)?;
            i += 1;
        }
        self.set_num_recs(tx, n - 1)
    }

    pub fn get_num_recs(&self, tx: &mut Transaction) -> Result<i32> {
        tx.get_int(self.block()?, 4)
    }

    fn block(&self) -> Result<&BlockId> {
        match &self.block {
            Some(block) => Ok(block),
            None => err_at!(Fatal, msg: "btree page used after close"),
        }
    }

    fn get_int(&self, tx: &mut Transaction, slot: i32, field: &str) -> Result<i32> {
        let pos = self.field_pos(slot, field)?;
        tx.get_int(self.block()?, pos)
    }

    fn get_string(&self, tx: &mut Transaction, slot: i32, field: &str) -> Result<String> {
        let pos = self.field_pos(slot, field)?;
        tx.get_string(self.block()?, pos)
    }

    fn get_val(&self, tx: &mut Transaction, slot: i32, field: &str) -> Result<Constant> {
        let val = match self.layout.schema().field_type(field)? {
            FieldType::Integer => Constant::Int(self.get_int(tx, slot, field)?),
            FieldType::Varchar => Constant::Str(self.get_string(tx, slot, field)?),
        };
        Ok(val)
    }

    fn set_int(
        &self,
        tx: &mut Transaction,
        slot: i32,
        field: &str,
        val: i32,
    ) -> Result<()> {
        let pos = self.field_pos(slot, field)?;
        let block = self.block()?.clone();
        tx.set_int(&block, pos, val, true)
    }

    fn set_string(
        &self,
        tx: &mut Transaction,
        slot: i32,
        field: &str,
        val: &str,
    ) -> Result<()> {
        let pos = self.field_pos(slot, field)?;
        let block = self.block()?.clone();
        tx.set_string(&block, pos, val, true)
    }

    fn set_val(
        &self,
        tx: &mut Transaction,
        slot: i32,
        field: &str,
        val: &Constant,
    ) -> Result<()> {
        match (self.layout.schema().field_type(field)?, val) {
            (FieldType::Integer, Constant::Int(ival)) => {
                self.set_int(tx, slot, field, *ival)
            }
            (FieldType::Varchar, Constant::Str(sval)) => {
                self.set_string(tx, slot, field, sval)
            }
            (ftype, val) => {
                err_at!(InvalidInput, msg: "field {} {:?} given {}", field, ftype, val)
            }
        }
    }

    fn set_num_recs(&self, tx: &mut Transaction, n: i32) -> Result<()> {
        let block = self.block()?.clone();
        tx.set_int(&block, 4, n, true)
    }

    // Open a hole at `slot`, shifting records up.
    fn insert(&self, tx: &mut Transaction, slot: i32) -> Result<()> {
        let n = self.get_num_recs(tx)?;
        let mut i = n;
        while i > slot {
            self.copy_record(tx, i - 1, i)?;
            i -= 1;
        }
        self.set_num_recs(tx, n + 1)
    }

    fn copy_record(&self, tx: &mut Transaction, from: i32, to: i32) -> Result<()> {
        for field in self.layout.schema().fields() {
            let val = self.get_val(tx, from, field)?;
            self.set_val(tx, to, field, &val)?;
        }
        Ok(())
    }

    // Move records from `slot` onward into `dest`, preserving order.
    fn transfer_records(
        &self,
        tx: &mut Transaction,
        slot: i32,
        dest: &BTPage,
    ) -> Result<()> {
        let mut dest_slot = 0;
        while slot < self.get_num_recs(tx)? {
            dest.insert(tx, dest_slot)?;
            for field in self.layout.schema().fields() {
                let val = self.get_val(tx, slot, field)?;
                dest.set_val(tx, dest_slot, field, &val)?;
            }
            self.delete(tx, slot)?;
            dest_slot += 1;
        }
        Ok(())
    }

    fn make_default_record(
        &self,
        tx: &mut Transaction,
        block: &BlockId,
        pos: usize,
    ) -> Result<()> {
        let schema = self.layout.schema();
        for field in schema.fields() {
            let offset = self.layout.offset(field)?;
            match schema.field_type(field)? {
                FieldType::Integer => tx.set_int(block, pos + offset, 0, false)?,
                FieldType::Varchar => tx.set_string(block, pos + offset, "", false)?,
            }
        }
        Ok(())
    }

    fn slot_pos(&self, slot: i32) -> Result<usize> {
        let slot = err_at!(FailConvert, usize::try_from(slot))?;
        Ok(8 + slot * self.layout.slot_size())
    }

    fn field_pos(&self, slot: i32, field: &str) -> Result<usize> {
        Ok(self.slot_pos(slot)? + self.layout.offset(field)?)
    }
}
