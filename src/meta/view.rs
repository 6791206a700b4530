use crate::{
    err_at,
    meta::table::{TableManager, MAX_NAME},
    record::{Layout, Schema, TableScan},
    tx::Transaction,
    Result,
};

/// Longest view definition `view_catalog` can store.
pub const MAX_VIEW_DEF: usize = 100;

/// Catalog of views, `view_catalog(view_name, view_def)`. A view is
/// its name and the SQL text of its defining query.
#[derive(Clone)]
pub struct ViewManager {
    layout: Layout,
}

impl ViewManager {
    pub fn new(
        is_new: bool,
        tables: &TableManager,
        tx: &mut Transaction,
    ) -> Result<ViewManager> {
        let mut schema = Schema::new();
        schema.add_string_field("view_name", MAX_NAME);
        schema.add_string_field("view_def", MAX_VIEW_DEF);
        if is_new {
            tables.create_table("view_catalog", &schema, tx)?;
        }
        Ok(ViewManager {
            layout: Layout::new(schema)?,
        })
    }

    pub fn create_view(
        &self,
        view_name: &str,
        view_def: &str,
        tx: &mut Transaction,
    ) -> Result<()> {
        if view_name.len() > MAX_NAME {
            return err_at!(InvalidInput, msg: "view name {} too long", view_name);
        }
        if view_def.len() > MAX_VIEW_DEF {
            return err_at!(
                InvalidInput, msg: "view definition {} bytes over {}",
                view_def.len(), MAX_VIEW_DEF
            );
        }

        let mut vcat = TableScan::new(tx, "view_catalog", self.layout.clone())?;
        vcat.insert(tx)?;
        vcat.set_string(tx, "view_name", view_name)?;
        vcat.set_string(tx, "view_def", view_def)?;
        vcat.close(tx)
    }

    /// The defining query of `view_name`, or None when no such view
    /// exists.
    pub fn get_view_def(
        &self,
        view_name: &str,
        tx: &mut Transaction,
    ) -> Result<Option<String>> {
        let mut result = None;
        let mut vcat = TableScan::new(tx, "view_catalog", self.layout.clone())?;
        while vcat.next(tx)? {
            if vcat.get_string(tx, "view_name")? == view_name {
                result = Some(vcat.get_string(tx, "view_def")?);
                break;
            }
        }
        vcat.close(tx)?;
        Ok(result)
    }
}
