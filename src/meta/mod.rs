//! Module `meta` implement the metadata catalogs.
//!
//! All metadata lives in ordinary tables: table layouts in
//! `table_catalog` and `field_catalog`, view texts in `view_catalog`,
//! index descriptions in `index_catalog`. [MetadataManager] fronts the
//! four managers behind one surface; one instance is shared by every
//! transaction of a database.

use std::collections::HashMap;

mod index;
mod stat;
mod table;
mod view;

pub use index::{IndexInfo, IndexManager};
pub use stat::{StatInfo, StatManager};
pub use table::{TableManager, MAX_NAME};
pub use view::{ViewManager, MAX_VIEW_DEF};

use crate::{
    index::IndexType,
    record::{Layout, Schema},
    tx::Transaction,
    Result,
};

/// One-stop surface over the table, view, statistics and index
/// catalogs.
pub struct MetadataManager {
    tables: TableManager,
    views: ViewManager,
    stats: StatManager,
    indexes: IndexManager,
}

impl MetadataManager {
    /// With `is_new`, create and seed the catalog tables.
    pub fn new(is_new: bool, tx: &mut Transaction) -> Result<MetadataManager> {
        let tables = TableManager::new(is_new, tx)?;
        let views = ViewManager::new(is_new, &tables, tx)?;
        let indexes = IndexManager::new(is_new, &tables, tx)?;
        let stats = StatManager::new(tables.clone(), tx)?;
        Ok(MetadataManager {
            tables,
            views,
            stats,
            indexes,
        })
    }

    pub fn create_table(
        &self,
        table_name: &str,
        schema: &Schema,
        tx: &mut Transaction,
    ) -> Result<()> {
        self.tables.create_table(table_name, schema, tx)
    }

    pub fn get_layout(&self, table_name: &str, tx: &mut Transaction) -> Result<Layout> {
        self.tables.get_layout(table_name, tx)
    }

    pub fn create_view(
        &self,
        view_name: &str,
        view_def: &str,
        tx: &mut Transaction,
    ) -> Result<()> {
        self.views.create_view(view_name, view_def, tx)
    }

    pub fn get_view_def(
        &self,
        view_name: &str,
        tx: &mut Transaction,
    ) -> Result<Option<String>> {
        self.views.get_view_def(view_name, tx)
    }

    /// Record an index of the given structure over
    /// `table_name.field_name`. The index files themselves are created
    /// lazily, the first time the index is opened.
    pub fn create_index(
        &self,
        index_name: &str,
        table_name: &str,
        field_name: &str,
        index_type: IndexType,
        tx: &mut Transaction,
    ) -> Result<()> {
        self.indexes
            .create_index(index_name, table_name, field_name, index_type, tx)
    }

    /// Indexes on `table_name`, keyed by indexed field.
    pub fn get_index_info(
        &self,
        table_name: &str,
        tx: &mut Transaction,
    ) -> Result<HashMap<String, IndexInfo>> {
        self.indexes
            .get_index_info(table_name, &self.tables, &self.stats, tx)
    }

    pub fn get_stat_info(
        &self,
        table_name: &str,
        layout: &Layout,
        tx: &mut Transaction,
    ) -> Result<StatInfo> {
        self.stats.get_stat_info(table_name, layout, tx)
    }
}
