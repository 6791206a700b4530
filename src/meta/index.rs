use std::{collections::HashMap, convert::TryFrom};

use crate::{
    err_at,
    index::{BTreeIndex, HashIndex, Index, IndexType},
    meta::{
        stat::{StatInfo, StatManager},
        table::{TableManager, MAX_NAME},
    },
    record::{FieldType, Layout, Schema, TableScan},
    tx::Transaction,
    Result,
};

/// Everything the planner needs to know about one index: which
/// structure it is, how to open it and what it costs to probe.
#[derive(Clone)]
pub struct IndexInfo {
    index_name: String,
    field_name: String,
    index_type: IndexType,
    layout: Layout,
    stats: StatInfo,
    block_size: usize,
}

impl IndexInfo {
    pub fn new(
        index_name: &str,
        field_name: &str,
        index_type: IndexType,
        table_schema: &Schema,
        stats: StatInfo,
        block_size: usize,
    ) -> Result<IndexInfo> {
        let layout = Self::index_layout(table_schema, field_name)?;
        Ok(IndexInfo {
            index_name: index_name.to_string(),
            field_name: field_name.to_string(),
            index_type,
            layout,
            stats,
            block_size,
        })
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Open the index for use. A btree formats its leaf and directory
    /// files on first open, so this needs the calling transaction.
    pub fn open(&self, tx: &mut Transaction) -> Result<Index> {
        let val = match self.index_type {
            IndexType::Hash => {
                Index::Hash(HashIndex::new(&self.index_name, self.layout.clone()))
            }
            IndexType::BTree => Index::BTree(BTreeIndex::new(
                tx,
                &self.index_name,
                self.layout.clone(),
            )?),
        };
        Ok(val)
    }

    /// Estimated block accesses for one probe.
    pub fn blocks_accessed(&self) -> i32 {
        let rpb = match i32::try_from(self.block_size / self.layout.slot_size()) {
            Ok(rpb) if rpb > 0 => rpb,
            _ => 1,
        };
        let num_blocks = self.stats.records_output() / rpb;
        self.index_type.search_cost(num_blocks, rpb)
    }

    /// Estimated number of matching records for one key.
    pub fn records_output(&self) -> i32 {
        let distinct = self.stats.distinct_values(&self.field_name).max(1);
        self.stats.records_output() / distinct
    }

    pub fn distinct_values(&self, field: &str) -> i32 {
        if self.field_name == field {
            1
        } else {
            self.stats.distinct_values(&self.field_name)
        }
    }

    // `(block, id, key)` records, the key typed after the indexed
    // field.
    fn index_layout(table_schema: &Schema, field_name: &str) -> Result<Layout> {
        let mut schema = Schema::new();
        schema.add_int_field("block");
        schema.add_int_field("id");
        match table_schema.field_type(field_name)? {
            FieldType::Integer => schema.add_int_field("key"),
            FieldType::Varchar => {
                schema.add_string_field("key", table_schema.length(field_name)?)
            }
        }
        Layout::new(schema)
    }
}

/// Catalog of indexes, `index_catalog(index_name, table_name,
/// field_name, index_type)`.
#[derive(Clone)]
pub struct IndexManager {
    layout: Layout,
}

impl IndexManager {
    pub fn new(
        is_new: bool,
        tables: &TableManager,
        tx: &mut Transaction,
    ) -> Result<IndexManager> {
        let mut schema = Schema::new();
        schema.add_string_field("index_name", MAX_NAME);
        schema.add_string_field("table_name", MAX_NAME);
        schema.add_string_field("field_name", MAX_NAME);
        schema.add_int_field("index_type");
        if is_new {
            tables.create_table("index_catalog", &schema, tx)?;
        }
        Ok(IndexManager {
            layout: Layout::new(schema)?,
        })
    }

    pub fn create_index(
        &self,
        index_name: &str,
        table_name: &str,
        field_name: &str,
        index_type: IndexType,
        tx: &mut Transaction,
    ) -> Result<()> {
        if index_name.len() > MAX_NAME {
            return err_at!(InvalidInput, msg: "index name {} too long", index_name);
        }
        let mut icat = TableScan::new(tx, "index_catalog", self.layout.clone())?;
        icat.insert(tx)?;
        icat.set_string(tx, "index_name", index_name)?;
        icat.set_string(tx, "table_name", table_name)?;
        icat.set_string(tx, "field_name", field_name)?;
        icat.set_int(tx, "index_type", index_type.to_code())?;
        icat.close(tx)
    }

    /// Map of indexed field name to [IndexInfo] for `table_name`.
    pub fn get_index_info(
        &self,
        table_name: &str,
        tables: &TableManager,
        stats: &StatManager,
        tx: &mut Transaction,
    ) -> Result<HashMap<String, IndexInfo>> {
        let mut result = HashMap::new();
        let mut icat = TableScan::new(tx, "index_catalog", self.layout.clone())?;
        while icat.next(tx)? {
            if icat.get_string(tx, "table_name")? == table_name {
                let index_name = icat.get_string(tx, "index_name")?;
                let field_name = icat.get_string(tx, "field_name")?;
                let index_type = IndexType::from_code(icat.get_int(tx, "index_type")?)?;
                let table_layout = tables.get_layout(table_name, tx)?;
                let stat_info = stats.get_stat_info(table_name, &table_layout, tx)?;
                let info = IndexInfo::new(
                    &index_name,
                    &field_name,
                    index_type,
                    table_layout.schema(),
                    stat_info,
                    tx.block_size(),
                )?;
                result.insert(field_name, info);
            }
        }
        icat.close(tx)?;
        Ok(result)
    }
}
