use crate::{
    err_at,
    query::Constant,
    record::{Layout, Rid, TableScan},
    tx::Transaction,
    Result,
};

/// Number of buckets in every static hash index.
pub const NUM_BUCKETS: usize = 100;

/// Static hash index.
///
/// Each bucket is an ordinary table named `{index_name}{bucket}`; a
/// key is assigned to a bucket by hashing its string form. Operations
/// open a table scan on the key's bucket and walk it.
pub struct HashIndex {
    index_name: String,
    layout: Layout,
    search_key: Option<Constant>,
    ts: Option<TableScan>,
}

impl HashIndex {
    pub fn new(index_name: &str, layout: Layout) -> HashIndex {
        HashIndex {
            index_name: index_name.to_string(),
            layout,
            search_key: None,
            ts: None,
        }
    }

    /// Cost of probing an index of `num_blocks` blocks: the size of
    /// one bucket.
    pub fn search_cost(num_blocks: i32, _records_per_block: i32) -> i32 {
        num_blocks / (NUM_BUCKETS as i32)
    }

    pub fn before_first(&mut self, tx: &mut Transaction, key: &Constant) -> Result<()> {
        self.close(tx)?;
        let bucket = bucket_of(key);
        let table_name = format!("{}{}", self.index_name, bucket);
        self.search_key = Some(key.clone());
        self.ts = Some(TableScan::new(tx, &table_name, self.layout.clone())?);
        Ok(())
    }

    pub fn next(&mut self, tx: &mut Transaction) -> Result<bool> {
        let (ts, key) = match (&mut self.ts, &self.search_key) {
            (Some(ts), Some(key)) => (ts, key),
            _ => return Ok(false),
        };
        while ts.next(tx)? {
            if ts.get_val(tx, "key")? == *key {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn get_rid(&self, tx: &mut Transaction) -> Result<Rid> {
        let ts = match &self.ts {
            Some(ts) => ts,
            None => return err_at!(Fatal, msg: "hash index not positioned"),
        };
        let blknum = ts.get_int(tx, "block")?;
        let slot = ts.get_int(tx, "id")?;
        Ok(Rid::new(blknum, slot))
    }

    pub fn insert(
        &mut self,
        tx: &mut Transaction,
        key: &Constant,
        rid: &Rid,
    ) -> Result<()> {
        self.before_first(tx, key)?;
        let ts = match &mut self.ts {
            Some(ts) => ts,
            None => return err_at!(Fatal, msg: "hash index not positioned"),
        };
        ts.insert(tx)?;
        ts.set_int(tx, "block", rid.block_number())?;
        ts.set_int(tx, "id", rid.slot())?;
        ts.set_val(tx, "key", key)
    }

    pub fn delete(
        &mut self,
        tx: &mut Transaction,
        key: &Constant,
        rid: &Rid,
    ) -> Result<()> {
        self.before_first(tx, key)?;
        while self.next(tx)? {
            if self.get_rid(tx)? == *rid {
                if let Some(ts) = &self.ts {
                    ts.delete(tx)?;
                }
                return Ok(());
            }
        }
        Ok(())
    }

    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        if let Some(mut ts) = self.ts.take() {
            ts.close(tx)?;
        }
        Ok(())
    }
}

// Bucket of a key: the city hash of its string form, reduced modulo
// the bucket count. City hash is seedless, so a key lands in the same
// bucket on every run and every platform, which matters because the
// bucket number is baked into the bucket table's file name.
fn bucket_of(key: &Constant) -> usize {
    let digest = match key {
        Constant::Int(val) => cityhash_rs::cityhash_110_128(val.to_string().as_bytes()),
        Constant::Str(val) => cityhash_rs::cityhash_110_128(val.as_bytes()),
    };
    (digest % (NUM_BUCKETS as u128)) as usize
}

#[cfg(test)]
#[path = "hash_test.rs"]
mod hash_test;
