use std::{
    collections::{HashMap, HashSet},
    convert::TryFrom,
    sync::Mutex,
};

use crate::{
    err_at,
    meta::table::TableManager,
    query::Constant,
    record::{Layout, TableScan},
    tx::Transaction,
    Result,
};

// Refresh everything after this many stat requests.
const REFRESH_CALLS: usize = 100;

/// Statistics for one table: block count, record count and per field
/// distinct-value estimates.
#[derive(Clone, Debug, Default)]
pub struct StatInfo {
    num_blocks: i32,
    num_records: i32,
    distinct: HashMap<String, i32>,
}

impl StatInfo {
    pub fn new(num_blocks: i32, num_records: i32, distinct: HashMap<String, i32>) -> StatInfo {
        StatInfo {
            num_blocks,
            num_records,
            distinct,
        }
    }

    #[inline]
    pub fn blocks_accessed(&self) -> i32 {
        self.num_blocks
    }

    #[inline]
    pub fn records_output(&self) -> i32 {
        self.num_records
    }

    /// Distinct values estimate for `field`, 1 when unknown.
    pub fn distinct_values(&self, field: &str) -> i32 {
        match self.distinct.get(field) {
            Some(n) => *n,
            None => 1,
        }
    }
}

struct StatInner {
    stats: HashMap<String, StatInfo>,
    num_calls: usize,
}

/// Table statistics, computed by full scans and cached.
///
/// Stats refresh on first sight of a table and wholesale every
/// [REFRESH_CALLS] requests, always under the manager's mutex, so
/// concurrent planners see a consistent snapshot.
pub struct StatManager {
    tables: TableManager,
    inner: Mutex<StatInner>,
}

impl StatManager {
    pub fn new(tables: TableManager, tx: &mut Transaction) -> Result<StatManager> {
        let val = StatManager {
            tables,
            inner: Mutex::new(StatInner {
                stats: HashMap::new(),
                num_calls: 0,
            }),
        };
        {
            let mut inner = err_at!(Fatal, val.inner.lock())?;
            val.refresh(&mut inner, tx)?;
        }
        Ok(val)
    }

    /// Statistics for `table_name`, recomputing on cache miss.
    pub fn get_stat_info(
        &self,
        table_name: &str,
        layout: &Layout,
        tx: &mut Transaction,
    ) -> Result<StatInfo> {
        let mut inner = err_at!(Fatal, self.inner.lock())?;

        inner.num_calls += 1;
        if inner.num_calls > REFRESH_CALLS {
            self.refresh(&mut inner, tx)?;
        }
        if !inner.stats.contains_key(table_name) {
            let info = Self::calc_table_stats(table_name, layout, tx)?;
            inner.stats.insert(table_name.to_string(), info);
        }
        match inner.stats.get(table_name) {
            Some(info) => Ok(info.clone()),
            None => err_at!(Fatal, msg: "stats missing for {}", table_name),
        }
    }

    fn refresh(&self, inner: &mut StatInner, tx: &mut Transaction) -> Result<()> {
        inner.stats = HashMap::new();
        inner.num_calls = 0;

        let tcat_layout = self.tables.get_layout("table_catalog", tx)?;
        let mut tcat = TableScan::new(tx, "table_catalog", tcat_layout)?;
        while tcat.next(tx)? {
            let table_name = tcat.get_string(tx, "table_name")?;
            if inner.stats.contains_key(&table_name) {
                continue;
            }
            let layout = self.tables.get_layout(&table_name, tx)?;
            let info = Self::calc_table_stats(&table_name, &layout, tx)?;
            inner.stats.insert(table_name, info);
        }
        tcat.close(tx)?;

        Ok(())
    }

    // One full scan of the table; distinct values are counted exactly
    // as of the scan, which may under-approximate by the time they are
    // used.
    fn calc_table_stats(
        table_name: &str,
        layout: &Layout,
        tx: &mut Transaction,
    ) -> Result<StatInfo> {
        let mut num_blocks = 0;
        let mut num_records = 0;
        let mut values: HashMap<String, HashSet<Constant>> = HashMap::new();

        let mut ts = TableScan::new(tx, table_name, layout.clone())?;
        while ts.next(tx)? {
            num_records += 1;
            num_blocks = ts.get_rid()?.block_number() + 1;
            for field in layout.schema().fields() {
                let val = ts.get_val(tx, field)?;
                values.entry(field.to_string()).or_default().insert(val);
            }
        }
        ts.close(tx)?;

        let mut distinct = HashMap::new();
        for (field, vals) in values.into_iter() {
            let n = i32::try_from(vals.len()).unwrap_or(i32::MAX);
            distinct.insert(field, n);
        }

        Ok(StatInfo::new(num_blocks, num_records, distinct))
    }
}

#[cfg(test)]
#[path = "stat_test.rs"]
mod stat_test;
