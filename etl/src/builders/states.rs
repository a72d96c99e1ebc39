use super::TableBuilder;
use crate::utils::frame::{lowercase_columns, read_csv, rename_columns};
use async_trait::async_trait;
use common::Result;
use datafusion::arrow::datatypes::DataType;
use datafusion::functions_aggregate::expr_fn::{avg, sum};
use datafusion::prelude::*;

/// State dimension: city-level demographics rolled up per state code.
pub struct StatesBuilder {
    states_path: String,
}

impl StatesBuilder {
    pub fn new(states_path: impl Into<String>) -> Self {
        Self {
            states_path: states_path.into(),
        }
    }
}

fn total(column: &str) -> Expr {
    sum(cast(ident(column), DataType::Int64))
}

fn mean(column: &str) -> Expr {
    avg(cast(ident(column), DataType::Float64))
}

#[async_trait]
impl TableBuilder for StatesBuilder {
    fn table_name(&self) -> &'static str {
        "states"
    }

    fn sort_keys(&self) -> &'static [&'static str] {
        &["state_id"]
    }

    async fn build(&self, ctx: &SessionContext) -> Result<DataFrame> {
        let states = read_csv(ctx, &self.states_path, b';').await?;
        let states = lowercase_columns(states)?;

        let states = states.aggregate(
            vec![ident("state code")],
            vec![
                total("male population").alias("male_population"),
                total("female population").alias("female_population"),
                total("total population").alias("total_population"),
                total("number of veterans").alias("veteran_num"),
                mean("average household size").alias("household_avg"),
                mean("median age").alias("median_age"),
            ],
        )?;

        rename_columns(states, &[("state code", "state_id")])
    }
}
