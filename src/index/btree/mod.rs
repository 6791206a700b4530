//! Module `btree` implement a B+-tree index.
//!
//! An index is two files: a directory file whose root is always block
//! 0, and a leaf file holding `(key, rid)` records. Pages of both
//! share the [page::BTPage] structure. Splits propagate directory
//! entries upward; a run of equal keys overflows sideways into a chain
//! of overflow blocks instead of splitting.

use std::convert::TryFrom;

mod dir;
mod leaf;
mod page;

pub use dir::BTreeDir;
pub use leaf::BTreeLeaf;
pub use page::BTPage;

use crate::{
    err_at,
    file::BlockId,
    query::Constant,
    record::{FieldType, Layout, Rid, Schema},
    tx::Transaction,
    Result,
};

/// A `(key, block)` pair handed up when a page splits.
#[derive(Clone, Debug, PartialEq)]
pub struct DirEntry {
    key: Constant,
    blknum: i32,
}

impl DirEntry {
    pub fn new(key: Constant, blknum: i32) -> DirEntry {
        DirEntry { key, blknum }
    }

    pub fn key(&self) -> &Constant {
        &self.key
    }

    #[inline]
    pub fn block_number(&self) -> i32 {
        self.blknum
    }
}

/// B+-tree index over `(key, rid)` records.
pub struct BTreeIndex {
    leaf_file: String,
    root_block: BlockId,
    leaf_layout: Layout,
    dir_layout: Layout,
    leaf: Option<BTreeLeaf>,
}

impl BTreeIndex {
    /// Open the index named `index_name`, creating and formatting its
    /// files on first use.
    pub fn new(
        tx: &mut Transaction,
        index_name: &str,
        leaf_layout: Layout,
    ) -> Result<BTreeIndex> {
        // the leaves
        let leaf_file = format!("{}leaf", index_name);
        if tx.size(&leaf_file)? == 0 {
            let block = tx.append(&leaf_file)?;
            let mut node = BTPage::new(tx, block.clone(), leaf_layout.clone())?;
            node.format(tx, &block, -1)?;
            node.close(tx)?;
        }

        // the directory
        let mut dir_schema = Schema::new();
        dir_schema.add("block", leaf_layout.schema())?;
        dir_schema.add("key", leaf_layout.schema())?;
        let dir_layout = Layout::new(dir_schema.clone())?;

        let dir_file = format!("{}directory", index_name);
        let root_block = BlockId::new(&dir_file, 0);
        if tx.size(&dir_file)? == 0 {
            tx.append(&dir_file)?;
            let mut node = BTPage::new(tx, root_block.clone(), dir_layout.clone())?;
            node.format(tx, &root_block, 0)?;
            // initial entry routes every key to leaf block 0
            let min_key = match dir_schema.field_type("key")? {
                FieldType::Integer => Constant::Int(i32::MIN),
                FieldType::Varchar => Constant::Str(String::new()),
            };
            node.insert_dir(tx, 0, &min_key, 0)?;
            node.close(tx)?;
        }

        Ok(BTreeIndex {
            leaf_file,
            root_block,
            leaf_layout,
            dir_layout,
            leaf: None,
        })
    }

    /// Cost of a root-to-leaf traversal for an index of `num_blocks`
    /// blocks with `records_per_block` directory entries per block.
    pub fn search_cost(num_blocks: i32, records_per_block: i32) -> i32 {
        if num_blocks <= 1 || records_per_block <= 1 {
            return 1;
        }
        let depth = (num_blocks as f64).ln() / (records_per_block as f64).ln();
        match i32::try_from(depth as i64) {
            Ok(depth) => 1 + depth,
            Err(_) => i32::MAX,
        }
    }

    /// Descend from the root and hold open the leaf block where `key`
    /// lives, positioned before its first occurrence.
    pub fn before_first(&mut self, tx: &mut Transaction, key: &Constant) -> Result<()> {
        self.close(tx)?;
        let mut root = BTreeDir::new(tx, self.root_block.clone(), self.dir_layout.clone())?;
        let blknum = root.search(tx, key)?;
        root.close(tx)?;
        let leaf_block = BlockId::new(&self.leaf_file, blknum);
        self.leaf = Some(BTreeLeaf::new(
            tx,
            leaf_block,
            self.leaf_layout.clone(),
            key.clone(),
        )?);
        Ok(())
    }

    pub fn next(&mut self, tx: &mut Transaction) -> Result<bool> {
        match &mut self.leaf {
            Some(leaf) => leaf.next(tx),
            None => err_at!(Fatal, msg: "btree index not positioned"),
        }
    }

    pub fn get_rid(&self, tx: &mut Transaction) -> Result<Rid> {
        match &self.leaf {
            Some(leaf) => leaf.get_rid(tx),
            None => err_at!(Fatal, msg: "btree index not positioned"),
        }
    }

    /// Insert `(key, rid)`, splitting leaves and directory pages as
    /// needed; a root split grows the tree a level.
    pub fn insert(
        &mut self,
        tx: &mut Transaction,
        key: &Constant,
        rid: &Rid,
    ) -> Result<()> {
        self.before_first(tx, key)?;
        let entry = match &mut self.leaf {
            Some(leaf) => leaf.insert(tx, rid)?,
            None => return err_at!(Fatal, msg: "btree index not positioned"),
        };
        self.close(tx)?;

        if let Some(entry) = entry {
            let mut root =
                BTreeDir::new(tx, self.root_block.clone(), self.dir_layout.clone())?;
            let entry2 = root.insert(tx, &entry)?;
            if let Some(entry2) = entry2 {
                root.make_new_root(tx, &entry2)?;
            }
            root.close(tx)?;
        }
        Ok(())
    }

    /// Delete the entry `(key, rid)` from the leaf holding it.
    pub fn delete(
        &mut self,
        tx: &mut Transaction,
        key: &Constant,
        rid: &Rid,
    ) -> Result<()> {
        self.before_first(tx, key)?;
        match &mut self.leaf {
            Some(leaf) => leaf.delete(tx, rid)?,
            None => return err_at!(Fatal, msg: "btree index not positioned"),
        }
        self.close(tx)
    }

    /// Unpin whatever leaf block is held open.
    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        if let Some(mut leaf) = self.leaf.take() {
            leaf.close(tx)?;
        }
        Ok(())
    }
}
