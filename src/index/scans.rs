use crate::{
    index::Index,
    query::{Constant, Scan},
    record::TableScan,
    tx::Transaction,
    Result,
};

/// Equality selection through an index: position the index on the key
/// and chase each matching RID into the table.
pub struct IndexSelectScan {
    ts: TableScan,
    index: Index,
    val: Constant,
}

impl IndexSelectScan {
    pub fn new(ts: TableScan, index: Index, val: Constant) -> IndexSelectScan {
        IndexSelectScan { ts, index, val }
    }

    pub fn before_first(&mut self, tx: &mut Transaction) -> Result<()> {
        self.index.before_first(tx, &self.val)
    }

    pub fn next(&mut self, tx: &mut Transaction) -> Result<bool> {
        let ok = self.index.next(tx)?;
        if ok {
            let rid = self.index.get_rid(tx)?;
            self.ts.move_to_rid(tx, &rid)?;
        }
        Ok(ok)
    }

    pub fn get_int(&self, tx: &mut Transaction, field: &str) -> Result<i32> {
        self.ts.get_int(tx, field)
    }

    pub fn get_string(&self, tx: &mut Transaction, field: &str) -> Result<String> {
        self.ts.get_string(tx, field)
    }

    pub fn get_val(&self, tx: &mut Transaction, field: &str) -> Result<Constant> {
        self.ts.get_val(tx, field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.ts.has_field(field)
    }

    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        self.index.close(tx)?;
        self.ts.close(tx)
    }
}

/// Join a scan against an indexed table: for every left record,
/// reposition the index on the join field's value and emit each
/// matching right record.
pub struct IndexJoinScan {
    lhs: Box<Scan>,
    index: Index,
    join_field: String,
    rhs: TableScan,
}

impl IndexJoinScan {
    pub fn new(lhs: Scan, index: Index, join_field: &str, rhs: TableScan) -> IndexJoinScan {
        IndexJoinScan {
            lhs: Box::new(lhs),
            index,
            join_field: join_field.to_string(),
            rhs,
        }
    }

    pub fn before_first(&mut self, tx: &mut Transaction) -> Result<()> {
        self.lhs.before_first(tx)?;
        self.lhs.next(tx)?;
        self.reset_index(tx)
    }

    pub fn next(&mut self, tx: &mut Transaction) -> Result<bool> {
        loop {
            if self.index.next(tx)? {
                let rid = self.index.get_rid(tx)?;
                self.rhs.move_to_rid(tx, &rid)?;
                return Ok(true);
            }
            if !self.lhs.next(tx)? {
                return Ok(false);
            }
            self.reset_index(tx)?;
        }
    }

    pub fn get_int(&self, tx: &mut Transaction, field: &str) -> Result<i32> {
        if self.rhs.has_field(field) {
            self.rhs.get_int(tx, field)
        } else {
            self.lhs.get_int(tx, field)
        }
    }

    pub fn get_string(&self, tx: &mut Transaction, field: &str) -> Result<String> {
        if self.rhs.has_field(field) {
            self.rhs.get_string(tx, field)
        } else {
            self.lhs.get_string(tx, field)
        }
    }

    pub fn get_val(&self, tx: &mut Transaction, field: &str) -> Result<Constant> {
        if self.rhs.has_field(field) {
            self.rhs.get_val(tx, field)
        } else {
            self.lhs.get_val(tx, field)
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.rhs.has_field(field) || self.lhs.has_field(field)
    }

    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        self.lhs.close(tx)?;
        self.index.close(tx)?;
        self.rhs.close(tx)
    }

    fn reset_index(&mut self, tx: &mut Transaction) -> Result<()> {
        let key = self.lhs.get_val(tx, &self.join_field)?;
        self.index.before_first(tx, &key)
    }
}
