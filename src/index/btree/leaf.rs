use crate::{
    file::BlockId,
    index::btree::{page::BTPage, DirEntry},
    query::Constant,
    record::{Layout, Rid},
    tx::Transaction,
    Result,
};

/// Contents of one B-tree leaf block, positioned for a search key.
///
/// Construction leaves the page immediately before the first record
/// with the key, if any. [BTreeLeaf::next] steps through matching
/// records, following the overflow chain when every key in the block
/// is the same.
pub struct BTreeLeaf {
    file_name: String,
    layout: Layout,
    search_key: Constant,
    contents: BTPage,
    current_slot: i32,
}

impl BTreeLeaf {
    pub fn new(
        tx: &mut Transaction,
        block: BlockId,
        layout: Layout,
        search_key: Constant,
    ) -> Result<BTreeLeaf> {
        let file_name = block.as_file_name().to_string();
        let contents = BTPage::new(tx, block, layout.clone())?;
        let current_slot = contents.find_slot_before(tx, &search_key)?;
        Ok(BTreeLeaf {
            file_name,
            layout,
            search_key,
            contents,
            current_slot,
        })
    }

    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        self.contents.close(tx)
    }

    /// Move to the next record matching the search key, possibly in an
    /// overflow block.
    pub fn next(&mut self, tx: &mut Transaction) -> Result<bool> {
        self.current_slot += 1;
        if self.current_slot < self.contents.get_num_recs(tx)?
            && self.contents.get_key(tx, self.current_slot)? == self.search_key
        {
            Ok(true)
        } else {
            self.try_overflow(tx)
        }
    }

    pub fn get_rid(&self, tx: &mut Transaction) -> Result<Rid> {
        self.contents.get_rid(tx, self.current_slot)
    }

    /// Delete the record with `rid` from among the matching records.
    pub fn delete(&mut self, tx: &mut Transaction, rid: &Rid) -> Result<()> {
        while self.next(tx)? {
            if self.get_rid(tx)? == *rid {
                self.contents.delete(tx, self.current_slot)?;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Insert a record for the search key. Splits the block when it
    /// overflows, returning the directory entry of the new sibling;
    /// when every key in the block is equal, all but the first record
    /// move to an overflow block chained through the flag instead.
    pub fn insert(&mut self, tx: &mut Transaction, rid: &Rid) -> Result<Option<DirEntry>> {
        // a record with a lesser key cannot share a page with an
        // overflow chain; peel the whole page off to a new block.
        if self.contents.get_flag(tx)? >= 0
            && self.contents.get_key(tx, 0)? > self.search_key
        {
            let first_key = self.contents.get_key(tx, 0)?;
            let flag = self.contents.get_flag(tx)?;
            let new_block = self.contents.split(tx, 0, flag)?;
            self.current_slot = 0;
            self.contents.set_flag(tx, -1)?;
            self.contents
                .insert_leaf(tx, self.current_slot, &self.search_key, rid)?;
            return Ok(Some(DirEntry::new(first_key, new_block.to_number())));
        }

        self.current_slot += 1;
        self.contents
            .insert_leaf(tx, self.current_slot, &self.search_key, rid)?;
        if !self.contents.is_full(tx)? {
            return Ok(None);
        }

        // page is full, split it
        let first_key = self.contents.get_key(tx, 0)?;
        let n = self.contents.get_num_recs(tx)?;
        let last_key = self.contents.get_key(tx, n - 1)?;
        if last_key == first_key {
            // every key equal: hang an overflow block off the flag
            let flag = self.contents.get_flag(tx)?;
            let new_block = self.contents.split(tx, 1, flag)?;
            self.contents.set_flag(tx, new_block.to_number())?;
            return Ok(None);
        }

        let mut split_pos = n / 2;
        let mut split_key = self.contents.get_key(tx, split_pos)?;
        if split_key == first_key {
            // move right, looking for the next key
            while self.contents.get_key(tx, split_pos)? == split_key {
                split_pos += 1;
            }
            split_key = self.contents.get_key(tx, split_pos)?;
        } else {
            // move left, looking for the first record with the key
            while self.contents.get_key(tx, split_pos - 1)? == split_key {
                split_pos -= 1;
            }
        }
        let new_block = self.contents.split(tx, split_pos, -1)?;
        Ok(Some(DirEntry::new(split_key, new_block.to_number())))
    }

    fn try_overflow(&mut self, tx: &mut Transaction) -> Result<bool> {
        let first_key = self.contents.get_key(tx, 0)?;
        let flag = self.contents.get_flag(tx)?;
        if self.search_key != first_key || flag < 0 {
            return Ok(false);
        }
        self.contents.close(tx)?;
        let next_block = BlockId::new(&self.file_name, flag);
        self.contents = BTPage::new(tx, next_block, self.layout.clone())?;
        self.current_slot = 0;
        Ok(true)
    }
}
