//! Module `plan` implement the planner surface.
//!
//! A [Plan] is an owned tree mirroring the scan tree it will open,
//! built bottom-up, immutable once built, opened once. Each node
//! estimates block accesses, output records and per-field distinct
//! values; the query planner uses the estimates to order products.
//! [Planner] is the entry point: SQL text in, a plan or an affected
//! record count out.

use std::{collections::HashSet, sync::Arc};

mod query;
mod update;

pub use query::QueryPlanner;
pub use update::UpdatePlanner;

use crate::{
    meta::{IndexInfo, MetadataManager, StatInfo},
    parse::Parser,
    query::{Constant, Predicate, ProductScan, ProjectScan, Scan, SelectScan},
    record::{Layout, Schema, TableScan},
    tx::Transaction,
    Result,
};

/// Scan over a stored table.
pub struct TablePlan {
    table_name: String,
    layout: Layout,
    stats: StatInfo,
}

impl TablePlan {
    pub fn new(
        tx: &mut Transaction,
        table_name: &str,
        meta: &MetadataManager,
    ) -> Result<TablePlan> {
        let layout = meta.get_layout(table_name, tx)?;
        let stats = meta.get_stat_info(table_name, &layout, tx)?;
        Ok(TablePlan {
            table_name: table_name.to_string(),
            layout,
            stats,
        })
    }
}

/// Predicate filter over a child plan.
pub struct SelectPlan {
    inner: Box<Plan>,
    pred: Predicate,
}

/// Field projection over a child plan.
pub struct ProjectPlan {
    inner: Box<Plan>,
    schema: Schema,
}

/// Cross product of two child plans.
pub struct ProductPlan {
    lhs: Box<Plan>,
    rhs: Box<Plan>,
    schema: Schema,
}

/// Equality lookup through an index.
pub struct IndexSelectPlan {
    inner: Box<TablePlan>,
    index_info: IndexInfo,
    val: Constant,
}

/// Indexed join of a child plan against a table.
pub struct IndexJoinPlan {
    lhs: Box<Plan>,
    rhs: Box<TablePlan>,
    index_info: IndexInfo,
    join_field: String,
    schema: Schema,
}

/// Owned tree of relational-algebra plan nodes.
pub enum Plan {
    Table(TablePlan),
    Select(SelectPlan),
    Project(ProjectPlan),
    Product(ProductPlan),
    IndexSelect(IndexSelectPlan),
    IndexJoin(IndexJoinPlan),
}

impl Plan {
    pub fn table(tx: &mut Transaction, table_name: &str, meta: &MetadataManager) -> Result<Plan> {
        Ok(Plan::Table(TablePlan::new(tx, table_name, meta)?))
    }

    pub fn select(inner: Plan, pred: Predicate) -> Plan {
        Plan::Select(SelectPlan {
            inner: Box::new(inner),
            pred,
        })
    }

    pub fn project(inner: Plan, field_list: &[String]) -> Result<Plan> {
        let mut schema = Schema::new();
        for field in field_list {
            schema.add(field, inner.schema())?;
        }
        Ok(Plan::Project(ProjectPlan {
            inner: Box::new(inner),
            schema,
        }))
    }

    pub fn product(lhs: Plan, rhs: Plan) -> Result<Plan> {
        let mut schema = Schema::new();
        schema.add_all(lhs.schema())?;
        schema.add_all(rhs.schema())?;
        Ok(Plan::Product(ProductPlan {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            schema,
        }))
    }

    pub fn index_select(inner: TablePlan, index_info: IndexInfo, val: Constant) -> Plan {
        Plan::IndexSelect(IndexSelectPlan {
            inner: Box::new(inner),
            index_info,
            val,
        })
    }

    pub fn index_join(
        lhs: Plan,
        rhs: TablePlan,
        index_info: IndexInfo,
        join_field: &str,
    ) -> Result<Plan> {
        let mut schema = Schema::new();
        schema.add_all(lhs.schema())?;
        schema.add_all(rhs.layout.schema())?;
        Ok(Plan::IndexJoin(IndexJoinPlan {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            index_info,
            join_field: join_field.to_string(),
            schema,
        }))
    }

    /// Open the scan tree this plan describes.
    pub fn open(&self, tx: &mut Transaction) -> Result<Scan> {
        match self {
            Plan::Table(plan) => {
                let ts = TableScan::new(tx, &plan.table_name, plan.layout.clone())?;
                Ok(Scan::Table(ts))
            }
            Plan::Select(plan) => {
                let inner = plan.inner.open(tx)?;
                Ok(Scan::Select(SelectScan::new(inner, plan.pred.clone())))
            }
            Plan::Project(plan) => {
                let inner = plan.inner.open(tx)?;
                let fields: HashSet<String> =
                    plan.schema.fields().iter().cloned().collect();
                Ok(Scan::Project(ProjectScan::new(inner, fields)))
            }
            Plan::Product(plan) => {
                let lhs = plan.lhs.open(tx)?;
                let rhs = plan.rhs.open(tx)?;
                Ok(Scan::Product(ProductScan::new(lhs, rhs)))
            }
            Plan::IndexSelect(plan) => {
                let ts = TableScan::new(
                    tx,
                    &plan.inner.table_name,
                    plan.inner.layout.clone(),
                )?;
                let index = plan.index_info.open(tx)?;
                Ok(Scan::IndexSelect(crate::index::IndexSelectScan::new(
                    ts,
                    index,
                    plan.val.clone(),
                )))
            }
            Plan::IndexJoin(plan) => {
                let lhs = plan.lhs.open(tx)?;
                let ts = TableScan::new(tx, &plan.rhs.table_name, plan.rhs.layout.clone())?;
                let index = plan.index_info.open(tx)?;
                Ok(Scan::IndexJoin(crate::index::IndexJoinScan::new(
                    lhs,
                    index,
                    &plan.join_field,
                    ts,
                )))
            }
        }
    }

    /// Estimated block accesses to consume the scan once.
    pub fn blocks_accessed(&self) -> i32 {
        match self {
            Plan::Table(plan) => plan.stats.blocks_accessed(),
            Plan::Select(plan) => plan.inner.blocks_accessed(),
            Plan::Project(plan) => plan.inner.blocks_accessed(),
            Plan::Product(plan) => {
                plan.lhs.blocks_accessed()
                    + plan.lhs.records_output() * plan.rhs.blocks_accessed()
            }
            Plan::IndexSelect(plan) => {
                plan.index_info.blocks_accessed() + self.records_output()
            }
            Plan::IndexJoin(plan) => {
                plan.lhs.blocks_accessed()
                    + plan.lhs.records_output() * plan.index_info.blocks_accessed()
                    + self.records_output()
            }
        }
    }

    /// Estimated number of records in the output.
    pub fn records_output(&self) -> i32 {
        match self {
            Plan::Table(plan) => plan.stats.records_output(),
            Plan::Select(plan) => {
                let factor = plan.pred.reduction_factor(&plan.inner).max(1);
                plan.inner.records_output() / factor
            }
            Plan::Project(plan) => plan.inner.records_output(),
            Plan::Product(plan) => {
                plan.lhs.records_output() * plan.rhs.records_output()
            }
            Plan::IndexSelect(plan) => plan.index_info.records_output(),
            Plan::IndexJoin(plan) => {
                plan.lhs.records_output() * plan.index_info.records_output()
            }
        }
    }

    /// Estimated distinct values of `field` in the output.
    pub fn distinct_values(&self, field: &str) -> i32 {
        match self {
            Plan::Table(plan) => plan.stats.distinct_values(field),
            Plan::Select(plan) => {
                if plan.pred.equates_with_constant(field).is_some() {
                    1
                } else if let Some(other) = plan.pred.equates_with_field(field) {
                    std::cmp::min(
                        plan.inner.distinct_values(field),
                        plan.inner.distinct_values(other),
                    )
                } else {
                    plan.inner.distinct_values(field)
                }
            }
            Plan::Project(plan) => plan.inner.distinct_values(field),
            Plan::Product(plan) => {
                if plan.lhs.schema().has_field(field) {
                    plan.lhs.distinct_values(field)
                } else {
                    plan.rhs.distinct_values(field)
                }
            }
            Plan::IndexSelect(plan) => plan.index_info.distinct_values(field),
            Plan::IndexJoin(plan) => {
                if plan.lhs.schema().has_field(field) {
                    plan.lhs.distinct_values(field)
                } else {
                    plan.rhs.stats.distinct_values(field)
                }
            }
        }
    }

    /// Schema of the output records.
    pub fn schema(&self) -> &Schema {
        match self {
            Plan::Table(plan) => plan.layout.schema(),
            Plan::Select(plan) => plan.inner.schema(),
            Plan::Project(plan) => &plan.schema,
            Plan::Product(plan) => &plan.schema,
            Plan::IndexSelect(plan) => plan.inner.layout.schema(),
            Plan::IndexJoin(plan) => &plan.schema,
        }
    }
}

/// SQL entry point: parses a statement and routes it to the query or
/// the update planner.
pub struct Planner {
    meta: Arc<MetadataManager>,
    query_planner: QueryPlanner,
    update_planner: UpdatePlanner,
}

impl Planner {
    pub fn new(meta: Arc<MetadataManager>) -> Planner {
        Planner {
            meta,
            query_planner: QueryPlanner::new(),
            update_planner: UpdatePlanner::new(),
        }
    }

    /// Plan the query `statement`.
    pub fn create_query_plan(&self, statement: &str, tx: &mut Transaction) -> Result<Plan> {
        let data = Parser::new(statement)?.parse_query()?;
        self.query_planner.create_plan(&data, &self.meta, tx)
    }

    /// Execute the update `statement`, returning the affected record
    /// count.
    pub fn execute_update(&self, statement: &str, tx: &mut Transaction) -> Result<i32> {
        let cmd = Parser::new(statement)?.parse_update_cmd()?;
        self.update_planner.execute(&cmd, &self.meta, tx)
    }
}
