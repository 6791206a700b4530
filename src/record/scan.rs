use crate::{
    err_at,
    file::BlockId,
    query::Constant,
    record::{FieldType, Layout, RecordPage, Rid},
    tx::Transaction,
    Result,
};

/// Iterator over the records of a table file, with insert, delete and
/// RID positioning. This is the updatable leaf of every scan tree.
///
/// The scan keeps one record page pinned at a time. Operations take
/// the owning transaction explicitly; a scan must only ever be used
/// with the transaction it was opened under.
pub struct TableScan {
    file_name: String,
    layout: Layout,
    rp: Option<RecordPage>,
    current_slot: i32,
}

impl TableScan {
    /// Open a scan over `table_name`, bootstrapping an empty file with
    /// one formatted block.
    pub fn new(
        tx: &mut Transaction,
        table_name: &str,
        layout: Layout,
    ) -> Result<TableScan> {
        let mut val = TableScan {
            file_name: format!("{}.tbl", table_name),
            layout,
            rp: None,
            current_slot: -1,
        };
        if tx.size(&val.file_name)? == 0 {
            val.move_to_new_block(tx)?;
        } else {
            val.move_to_block(tx, 0)?;
        }
        Ok(val)
    }

    /// Position before the first record.
    pub fn before_first(&mut self, tx: &mut Transaction) -> Result<()> {
        self.move_to_block(tx, 0)
    }

    /// Advance to the next record, moving across blocks as needed.
    pub fn next(&mut self, tx: &mut Transaction) -> Result<bool> {
        self.current_slot = self.rp()?.next_after(tx, self.current_slot)?;
        while self.current_slot < 0 {
            if self.at_last_block(tx)? {
                return Ok(false);
            }
            let blknum = self.rp()?.block().to_number() + 1;
            self.move_to_block(tx, blknum)?;
            self.current_slot = self.rp()?.next_after(tx, self.current_slot)?;
        }
        Ok(true)
    }

    pub fn get_int(&self, tx: &mut Transaction, field: &str) -> Result<i32> {
        self.rp()?.get_int(tx, self.current_slot, field)
    }

    pub fn get_string(&self, tx: &mut Transaction, field: &str) -> Result<String> {
        self.rp()?.get_string(tx, self.current_slot, field)
    }

    pub fn get_val(&self, tx: &mut Transaction, field: &str) -> Result<Constant> {
        let val = match self.layout.schema().field_type(field)? {
            FieldType::Integer => Constant::Int(self.get_int(tx, field)?),
            FieldType::Varchar => Constant::Str(self.get_string(tx, field)?),
        };
        Ok(val)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.layout.schema().has_field(field)
    }

    /// Unpin the currently held record page.
    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        if let Some(rp) = self.rp.take() {
            tx.unpin(rp.block())?;
        }
        Ok(())
    }

    pub fn set_int(&self, tx: &mut Transaction, field: &str, val: i32) -> Result<()> {
        self.rp()?.set_int(tx, self.current_slot, field, val)
    }

    pub fn set_string(
        &self,
        tx: &mut Transaction,
        field: &str,
        val: &str,
    ) -> Result<()> {
        self.rp()?.set_string(tx, self.current_slot, field, val)
    }

    pub fn set_val(
        &self,
        tx: &mut Transaction,
        field: &str,
        val: &Constant,
    ) -> Result<()> {
        match (self.layout.schema().field_type(field)?, val) {
            (FieldType::Integer, Constant::Int(ival)) => {
                self.set_int(tx, field, *ival)
            }
            (FieldType::Varchar, Constant::Str(sval)) => {
                self.set_string(tx, field, sval)
            }
            (ftype, val) => {
                err_at!(InvalidInput, msg: "field {} {:?} given {}", field, ftype, val)
            }
        }
    }

    /// Move to an empty slot, claiming it, appending and formatting a
    /// fresh block when every existing block is full. The scan is left
    /// positioned on the claimed slot.
    pub fn insert(&mut self, tx: &mut Transaction) -> Result<()> {
        self.current_slot = self.rp()?.insert_after(tx, self.current_slot)?;
        while self.current_slot < 0 {
            if self.at_last_block(tx)? {
                self.move_to_new_block(tx)?;
            } else {
                let blknum = self.rp()?.block().to_number() + 1;
                self.move_to_block(tx, blknum)?;
            }
            self.current_slot = self.rp()?.insert_after(tx, self.current_slot)?;
        }
        Ok(())
    }

    /// Delete the current record.
    pub fn delete(&self, tx: &mut Transaction) -> Result<()> {
        self.rp()?.delete(tx, self.current_slot)
    }

    /// Identifier of the current record.
    pub fn get_rid(&self) -> Result<Rid> {
        Ok(Rid::new(self.rp()?.block().to_number(), self.current_slot))
    }

    /// Position the scan on the record identified by `rid`.
    pub fn move_to_rid(&mut self, tx: &mut Transaction, rid: &Rid) -> Result<()> {
        self.close(tx)?;
        let block = BlockId::new(&self.file_name, rid.block_number());
        self.rp = Some(RecordPage::new(tx, block, self.layout.clone())?);
        self.current_slot = rid.slot();
        Ok(())
    }

    fn move_to_block(&mut self, tx: &mut Transaction, blknum: i32) -> Result<()> {
        self.close(tx)?;
        let block = BlockId::new(&self.file_name, blknum);
        self.rp = Some(RecordPage::new(tx, block, self.layout.clone())?);
        self.current_slot = -1;
        Ok(())
    }

    fn move_to_new_block(&mut self, tx: &mut Transaction) -> Result<()> {
        self.close(tx)?;
        let block = tx.append(&self.file_name)?;
        let rp = RecordPage::new(tx, block, self.layout.clone())?;
        rp.format(tx)?;
        self.rp = Some(rp);
        self.current_slot = -1;
        Ok(())
    }

    fn at_last_block(&self, tx: &mut Transaction) -> Result<bool> {
        let n = tx.size(&self.file_name)?;
        Ok(self.rp()?.block().to_number() == n - 1)
    }

    fn rp(&self) -> Result<&RecordPage> {
        match &self.rp {
            Some(rp) => Ok(rp),
            None => err_at!(Fatal, msg: "table scan used after close"),
        }
    }
}

#[cfg(test)]
#[path = "scan_test.rs"]
mod scan_test;
