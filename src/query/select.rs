use crate::{
    query::{Constant, Predicate, Scan},
    record::Rid,
    tx::Transaction,
    Result,
};

/// Filter an underlying scan by a predicate.
///
/// When the inner scan is updatable the select scan is too, update
/// calls forward straight through. That capability is fixed when the
/// tree is built; the update planner only ever builds selects over
/// table scans.
pub struct SelectScan {
    inner: Box<Scan>,
    pred: Predicate,
}

impl SelectScan {
    pub fn new(inner: Scan, pred: Predicate) -> SelectScan {
        SelectScan {
            inner: Box::new(inner),
            pred,
        }
    }

    pub fn before_first(&mut self, tx: &mut Transaction) -> Result<()> {
        self.inner.before_first(tx)
    }

    /// Advance to the next record satisfying the predicate.
    pub fn next(&mut self, tx: &mut Transaction) -> Result<bool> {
        while self.inner.next(tx)? {
            if self.pred.is_satisfied(&self.inner, tx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn get_int(&self, tx: &mut Transaction, field: &str) -> Result<i32> {
        self.inner.get_int(tx, field)
    }

    pub fn get_string(&self, tx: &mut Transaction, field: &str) -> Result<String> {
        self.inner.get_string(tx, field)
    }

    pub fn get_val(&self, tx: &mut Transaction, field: &str) -> Result<Constant> {
        self.inner.get_val(tx, field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.inner.has_field(field)
    }

    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        self.inner.close(tx)
    }

    pub fn set_int(&mut self, tx: &mut Transaction, field: &str, val: i32) -> Result<()> {
        self.inner.set_int(tx, field, val)
    }

    pub fn set_string(
        &mut self,
        tx: &mut Transaction,
        field: &str,
        val: &str,
    ) -> Result<()> {
        self.inner.set_string(tx, field, val)
    }

    pub fn set_val(
        &mut self,
        tx: &mut Transaction,
        field: &str,
        val: &Constant,
    ) -> Result<()> {
        self.inner.set_val(tx, field, val)
    }

    pub fn insert(&mut self, tx: &mut Transaction) -> Result<()> {
        self.inner.insert(tx)
    }

    pub fn delete(&mut self, tx: &mut Transaction) -> Result<()> {
        self.inner.delete(tx)
    }

    pub fn get_rid(&self) -> Result<Rid> {
        self.inner.get_rid()
    }

    pub fn move_to_rid(&mut self, tx: &mut Transaction, rid: &Rid) -> Result<()> {
        self.inner.move_to_rid(tx, rid)
    }
}
