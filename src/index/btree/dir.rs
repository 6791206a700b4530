use crate::{
    file::BlockId,
    index::btree::{page::BTPage, DirEntry},
    query::Constant,
    record::Layout,
    tx::Transaction,
    Result,
};

/// Contents of one B-tree directory block.
///
/// Directory records are `(key, child block)` pairs sorted by key; the
/// page flag holds the level, 0 immediately above the leaves.
pub struct BTreeDir {
    file_name: String,
    layout: Layout,
    contents: BTPage,
}

impl BTreeDir {
    pub fn new(tx: &mut Transaction, block: BlockId, layout: Layout) -> Result<BTreeDir> {
        let file_name = block.as_file_name().to_string();
        let contents = BTPage::new(tx, block, layout.clone())?;
        Ok(BTreeDir {
            file_name,
            layout,
            contents,
        })
    }

    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        self.contents.close(tx)
    }

    /// Walk down from this page to level 0 and return the number of
    /// the leaf block where `key` belongs.
    pub fn search(&mut self, tx: &mut Transaction, key: &Constant) -> Result<i32> {
        let mut child_block = self.find_child_block(tx, key)?;
        while self.contents.get_flag(tx)? > 0 {
            self.contents.close(tx)?;
            self.contents = BTPage::new(tx, child_block, self.layout.clone())?;
            child_block = self.find_child_block(tx, key)?;
        }
        Ok(child_block.to_number())
    }

    /// Grow the tree by one level: the root's records move to a new
    /// block and the root is left with two entries, the old contents
    /// and `entry`. The root stays at block 0.
    pub fn make_new_root(&mut self, tx: &mut Transaction, entry: &DirEntry) -> Result<()> {
        let first_key = self.contents.get_key(tx, 0)?;
        let level = self.contents.get_flag(tx)?;
        let new_block = self.contents.split(tx, 0, level)?; // transfer all records
        let old_root = DirEntry::new(first_key, new_block.to_number());
        self.insert_entry(tx, &old_root)?;
        self.insert_entry(tx, entry)?;
        self.contents.set_flag(tx, level + 1)
    }

    /// Insert `entry` into the subtree rooted at this page. Returns
    /// the directory entry for this level's new sibling if this page
    /// had to split.
    pub fn insert(
        &mut self,
        tx: &mut Transaction,
        entry: &DirEntry,
    ) -> Result<Option<DirEntry>> {
        if self.contents.get_flag(tx)? == 0 {
            return self.insert_entry(tx, entry);
        }
        let child_block = self.find_child_block(tx, entry.key())?;
        let mut child = BTreeDir::new(tx, child_block, self.layout.clone())?;
        let my_entry = child.insert(tx, entry)?;
        child.close(tx)?;
        match my_entry {
            Some(entry) => self.insert_entry(tx, &entry),
            None => Ok(None),
        }
    }

    fn insert_entry(
        &mut self,
        tx: &mut Transaction,
        entry: &DirEntry,
    ) -> Result<Option<DirEntry>> {
        let new_slot = 1 + self.contents.find_slot_before(tx, entry.key())?;
        self.contents
            .insert_dir(tx, new_slot, entry.key(), entry.block_number())?;
        if !self.contents.is_full(tx)? {
            return Ok(None);
        }
        let level = self.contents.get_flag(tx)?;
        let split_pos = self.contents.get_num_recs(tx)? / 2;
        let split_key = self.contents.get_key(tx, split_pos)?;
        let new_block = self.contents.split(tx, split_pos, level)?;
        Ok(Some(DirEntry::new(split_key, new_block.to_number())))
    }

    fn find_child_block(&self, tx: &mut Transaction, key: &Constant) -> Result<BlockId> {
        let mut slot = self.contents.find_slot_before(tx, key)?;
        if self.contents.get_key(tx, slot + 1)? == *key {
            slot += 1;
        }
        let blknum = self.contents.get_child_num(tx, slot)?;
        Ok(BlockId::new(&self.file_name, blknum))
    }
}
