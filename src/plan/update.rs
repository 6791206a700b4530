use crate::{
    index::IndexType,
    meta::MetadataManager,
    parse::{
        CreateIndexData, CreateTableData, CreateViewData, DeleteData, InsertData,
        ModifyData, UpdateCmd,
    },
    plan::Plan,
    tx::Transaction,
    Result,
};

/// Executes update statements, keeping every index on the mutated
/// table in step with the table itself.
pub struct UpdatePlanner;

impl UpdatePlanner {
    pub fn new() -> UpdatePlanner {
        UpdatePlanner
    }

    pub fn execute(
        &self,
        cmd: &UpdateCmd,
        meta: &MetadataManager,
        tx: &mut Transaction,
    ) -> Result<i32> {
        match cmd {
            UpdateCmd::Insert(data) => self.execute_insert(data, meta, tx),
            UpdateCmd::Delete(data) => self.execute_delete(data, meta, tx),
            UpdateCmd::Modify(data) => self.execute_modify(data, meta, tx),
            UpdateCmd::CreateTable(data) => self.execute_create_table(data, meta, tx),
            UpdateCmd::CreateView(data) => self.execute_create_view(data, meta, tx),
            UpdateCmd::CreateIndex(data) => self.execute_create_index(data, meta, tx),
        }
    }

    /// Insert the record, then add an index entry for every indexed
    /// field among the supplied values.
    pub fn execute_insert(
        &self,
        data: &InsertData,
        meta: &MetadataManager,
        tx: &mut Transaction,
    ) -> Result<i32> {
        let plan = Plan::table(tx, &data.table_name, meta)?;
        let mut scan = plan.open(tx)?;
        scan.insert(tx)?;
        let rid = scan.get_rid()?;

        let mut indexes = meta.get_index_info(&data.table_name, tx)?;
        for (field, val) in data.fields.iter().zip(data.values.iter()) {
            scan.set_val(tx, field, val)?;
            if let Some(info) = indexes.remove(field) {
                let mut index = info.open(tx)?;
                index.insert(tx, val, &rid)?;
                index.close(tx)?;
            }
        }
        scan.close(tx)?;
        Ok(1)
    }

    /// Delete matching records, removing their entries from every
    /// index first.
    pub fn execute_delete(
        &self,
        data: &DeleteData,
        meta: &MetadataManager,
        tx: &mut Transaction,
    ) -> Result<i32> {
        let plan = Plan::select(
            Plan::table(tx, &data.table_name, meta)?,
            data.pred.clone(),
        );
        let indexes = meta.get_index_info(&data.table_name, tx)?;

        let mut scan = plan.open(tx)?;
        let mut count = 0;
        while scan.next(tx)? {
            let rid = scan.get_rid()?;
            for (field, info) in indexes.iter() {
                let val = scan.get_val(tx, field)?;
                let mut index = info.open(tx)?;
                index.delete(tx, &val, &rid)?;
                index.close(tx)?;
            }
            scan.delete(tx)?;
            count += 1;
        }
        scan.close(tx)?;
        Ok(count)
    }

    /// Update the target field of matching records, moving the index
    /// entry on that field when one exists.
    pub fn execute_modify(
        &self,
        data: &ModifyData,
        meta: &MetadataManager,
        tx: &mut Transaction,
    ) -> Result<i32> {
        let plan = Plan::select(
            Plan::table(tx, &data.table_name, meta)?,
            data.pred.clone(),
        );
        let mut indexes = meta.get_index_info(&data.table_name, tx)?;
        let mut index = match indexes.remove(&data.field_name) {
            Some(info) => Some(info.open(tx)?),
            None => None,
        };

        let mut scan = plan.open(tx)?;
        let mut count = 0;
        while scan.next(tx)? {
            let new_val = data.new_value.evaluate(&scan, tx)?;
            let old_val = scan.get_val(tx, &data.field_name)?;
            scan.set_val(tx, &data.field_name, &new_val)?;

            if let Some(index) = index.as_mut() {
                let rid = scan.get_rid()?;
                index.delete(tx, &old_val, &rid)?;
                index.insert(tx, &new_val, &rid)?;
            }
            count += 1;
        }
        if let Some(index) = index.as_mut() {
            index.close(tx)?;
        }
        scan.close(tx)?;
        Ok(count)
    }

    pub fn execute_create_table(
        &self,
        data: &CreateTableData,
        meta: &MetadataManager,
        tx: &mut Transaction,
    ) -> Result<i32> {
        meta.create_table(&data.table_name, &data.schema, tx)?;
        Ok(0)
    }

    pub fn execute_create_view(
        &self,
        data: &CreateViewData,
        meta: &MetadataManager,
        tx: &mut Transaction,
    ) -> Result<i32> {
        meta.create_view(&data.view_name, &data.view_def_text(), tx)?;
        Ok(0)
    }

    /// The statement has no index-kind syntax; indexes created through
    /// SQL are btrees.
    pub fn execute_create_index(
        &self,
        data: &CreateIndexData,
        meta: &MetadataManager,
        tx: &mut Transaction,
    ) -> Result<i32> {
        meta.create_index(
            &data.index_name,
            &data.table_name,
            &data.field_name,
            IndexType::BTree,
            tx,
        )?;
        Ok(0)
    }
}

impl Default for UpdatePlanner {
    fn default() -> Self {
        Self::new()
    }
}
