use crate::{
    query::{Constant, Scan},
    tx::Transaction,
    Result,
};

/// Nested loop cross product of two scans. The left scan is the outer
/// loop; for every left record the right scan is replayed in full.
pub struct ProductScan {
    lhs: Box<Scan>,
    rhs: Box<Scan>,
}

impl ProductScan {
    pub fn new(lhs: Scan, rhs: Scan) -> ProductScan {
        ProductScan {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Position the left scan on its first record and the right scan
    /// before its first.
    pub fn before_first(&mut self, tx: &mut Transaction) -> Result<()> {
        self.lhs.before_first(tx)?;
        self.lhs.next(tx)?;
        self.rhs.before_first(tx)
    }

    /// Advance the right scan; when it runs out, rewind it and advance
    /// the left scan.
    pub fn next(&mut self, tx: &mut Transaction) -> Result<bool> {
        if self.rhs.next(tx)? {
            return Ok(true);
        }
        self.rhs.before_first(tx)?;
        Ok(self.rhs.next(tx)? && self.lhs.next(tx)?)
    }

    pub fn get_int(&self, tx: &mut Transaction, field: &str) -> Result<i32> {
        if self.lhs.has_field(field) {
            self.lhs.get_int(tx, field)
        } else {
            self.rhs.get_int(tx, field)
        }
    }

    pub fn get_string(&self, tx: &mut Transaction, field: &str) -> Result<String> {
        if self.lhs.has_field(field) {
            self.lhs.get_string(tx, field)
        } else {
            self.rhs.get_string(tx, field)
        }
    }

    pub fn get_val(&self, tx: &mut Transaction, field: &str) -> Result<Constant> {
        if self.lhs.has_field(field) {
            self.lhs.get_val(tx, field)
        } else {
            self.rhs.get_val(tx, field)
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.lhs.has_field(field) || self.rhs.has_field(field)
    }

    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        self.lhs.close(tx)?;
        self.rhs.close(tx)
    }
}
