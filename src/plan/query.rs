use crate::{
    err_at,
    meta::MetadataManager,
    parse::{Parser, QueryData},
    plan::Plan,
    tx::Transaction,
    Result,
};

/// Plans queries: view expansion, cheapest-order product of the
/// mentioned tables, selection by the full predicate, projection onto
/// the field list.
pub struct QueryPlanner;

impl QueryPlanner {
    pub fn new() -> QueryPlanner {
        QueryPlanner
    }

    pub fn create_plan(
        &self,
        data: &QueryData,
        meta: &MetadataManager,
        tx: &mut Transaction,
    ) -> Result<Plan> {
        // a plan per table or view mentioned
        let mut plans = vec![];
        for table_name in data.tables.iter() {
            match meta.get_view_def(table_name, tx)? {
                Some(view_def) => {
                    let view_data = Parser::new(&view_def)?.parse_query()?;
                    plans.push(self.create_plan(&view_data, meta, tx)?);
                }
                None => plans.push(Plan::table(tx, table_name, meta)?),
            }
        }

        // product them together, trying both operand orders and
        // keeping the one that reads fewer blocks
        let mut plans = plans.into_iter();
        let mut plan = match plans.next() {
            Some(plan) => plan,
            None => return err_at!(InvalidInput, msg: "query names no table"),
        };
        for next_plan in plans {
            let cost1 = next_plan.blocks_accessed()
                + next_plan.records_output().saturating_mul(plan.blocks_accessed());
            let cost2 = plan.blocks_accessed()
                + plan.records_output().saturating_mul(next_plan.blocks_accessed());
            plan = if cost1 < cost2 {
                Plan::product(next_plan, plan)?
            } else {
                Plan::product(plan, next_plan)?
            };
        }

        // select, then project
        let plan = Plan::select(plan, data.pred.clone());
        Plan::project(plan, &data.fields)
    }
}

impl Default for QueryPlanner {
    fn default() -> Self {
        Self::new()
    }
}
