use crate::{
    err_at,
    query::{Constant, FieldSet, Scan},
    tx::Transaction,
    Result,
};

/// Restrict an underlying scan to a set of fields. Iteration
/// delegates; field access outside the set is a [crate::Error::KeyNotFound].
pub struct ProjectScan {
    inner: Box<Scan>,
    fields: FieldSet,
}

impl ProjectScan {
    pub fn new(inner: Scan, fields: FieldSet) -> ProjectScan {
        ProjectScan {
            inner: Box::new(inner),
            fields,
        }
    }

    pub fn before_first(&mut self, tx: &mut Transaction) -> Result<()> {
        self.inner.before_first(tx)
    }

    pub fn next(&mut self, tx: &mut Transaction) -> Result<bool> {
        self.inner.next(tx)
    }

    pub fn get_int(&self, tx: &mut Transaction, field: &str) -> Result<i32> {
        self.check(field)?;
        self.inner.get_int(tx, field)
    }

    pub fn get_string(&self, tx: &mut Transaction, field: &str) -> Result<String> {
        self.check(field)?;
        self.inner.get_string(tx, field)
    }

    pub fn get_val(&self, tx: &mut Transaction, field: &str) -> Result<Constant> {
        self.check(field)?;
        self.inner.get_val(tx, field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        self.inner.close(tx)
    }

    fn check(&self, field: &str) -> Result<()> {
        if self.fields.contains(field) {
            Ok(())
        } else {
            err_at!(KeyNotFound, msg: "field {} not projected", field)
        }
    }
}
