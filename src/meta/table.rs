use std::{collections::HashMap, convert::TryFrom};

use crate::{
    err_at,
    record::{FieldType, Layout, Schema, TableScan},
    tx::Transaction,
    Result,
};

/// Longest table, view, index or field name the catalogs can store.
pub const MAX_NAME: usize = 16;

/// Catalog of tables.
///
/// Two self describing tables carry every table's physical layout:
/// `table_catalog(table_name, slot_size)` and
/// `field_catalog(table_name, field_name, type, length, offset)`.
#[derive(Clone)]
pub struct TableManager {
    tcat_layout: Layout,
    fcat_layout: Layout,
}

impl TableManager {
    /// With `is_new`, write the catalog tables' own rows into the
    /// catalogs.
    pub fn new(is_new: bool, tx: &mut Transaction) -> Result<TableManager> {
        let mut tcat_schema = Schema::new();
        tcat_schema.add_string_field("table_name", MAX_NAME);
        tcat_schema.add_int_field("slot_size");
        let tcat_layout = Layout::new(tcat_schema.clone())?;

        let mut fcat_schema = Schema::new();
        fcat_schema.add_string_field("table_name", MAX_NAME);
        fcat_schema.add_string_field("field_name", MAX_NAME);
        fcat_schema.add_int_field("type");
        fcat_schema.add_int_field("length");
        fcat_schema.add_int_field("offset");
        let fcat_layout = Layout::new(fcat_schema.clone())?;

        let val = TableManager {
            tcat_layout,
            fcat_layout,
        };

        if is_new {
            val.create_table("table_catalog", &tcat_schema, tx)?;
            val.create_table("field_catalog", &fcat_schema, tx)?;
        }

        Ok(val)
    }

    /// Record `schema` for `table_name` in the catalogs.
    pub fn create_table(
        &self,
        table_name: &str,
        schema: &Schema,
        tx: &mut Transaction,
    ) -> Result<()> {
        if table_name.len() > MAX_NAME {
            return err_at!(InvalidInput, msg: "table name {} too long", table_name);
        }
        let layout = Layout::new(schema.clone())?;

        let mut tcat = TableScan::new(tx, "table_catalog", self.tcat_layout.clone())?;
        tcat.insert(tx)?;
        tcat.set_string(tx, "table_name", table_name)?;
        let slot_size = err_at!(FailConvert, i32::try_from(layout.slot_size()))?;
        tcat.set_int(tx, "slot_size", slot_size)?;
        tcat.close(tx)?;

        let mut fcat = TableScan::new(tx, "field_catalog", self.fcat_layout.clone())?;
        for field in schema.fields() {
            if field.len() > MAX_NAME {
                fcat.close(tx)?;
                return err_at!(InvalidInput, msg: "field name {} too long", field);
            }
            fcat.insert(tx)?;
            fcat.set_string(tx, "table_name", table_name)?;
            fcat.set_string(tx, "field_name", field)?;
            fcat.set_int(tx, "type", schema.field_type(field)?.to_code())?;
            let length = err_at!(FailConvert, i32::try_from(schema.length(field)?))?;
            fcat.set_int(tx, "length", length)?;
            let offset = err_at!(FailConvert, i32::try_from(layout.offset(field)?))?;
            fcat.set_int(tx, "offset", offset)?;
        }
        fcat.close(tx)?;

        Ok(())
    }

    /// Reassemble the layout of `table_name` from the catalogs.
    pub fn get_layout(&self, table_name: &str, tx: &mut Transaction) -> Result<Layout> {
        let mut slot_size: Option<usize> = None;
        let mut tcat = TableScan::new(tx, "table_catalog", self.tcat_layout.clone())?;
        while tcat.next(tx)? {
            if tcat.get_string(tx, "table_name")? == table_name {
                let n = tcat.get_int(tx, "slot_size")?;
                slot_size = Some(err_at!(FailConvert, usize::try_from(n))?);
                break;
            }
        }
        tcat.close(tx)?;

        let slot_size = match slot_size {
            Some(slot_size) => slot_size,
            None => return err_at!(KeyNotFound, msg: "table {}", table_name),
        };

        let mut schema = Schema::new();
        let mut offsets: HashMap<String, usize> = HashMap::new();
        let mut fcat = TableScan::new(tx, "field_catalog", self.fcat_layout.clone())?;
        while fcat.next(tx)? {
            if fcat.get_string(tx, "table_name")? == table_name {
                let field = fcat.get_string(tx, "field_name")?;
                let ftype = FieldType::from_code(fcat.get_int(tx, "type")?)?;
                let length = err_at!(FailConvert, usize::try_from(fcat.get_int(tx, "length")?))?;
                let offset = err_at!(FailConvert, usize::try_from(fcat.get_int(tx, "offset")?))?;
                schema.add_field(&field, ftype, length);
                offsets.insert(field, offset);
            }
        }
        fcat.close(tx)?;

        Ok(Layout::from_parts(schema, offsets, slot_size))
    }
}

#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;
