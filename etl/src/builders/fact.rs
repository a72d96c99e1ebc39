use super::TableBuilder;
use crate::utils::frame::drop_duplicates;
use async_trait::async_trait;
use common::Result;
use datafusion::arrow::datatypes::DataType;
use datafusion::prelude::*;

const SECONDS_PER_DAY: i64 = 86_400;

/// Fact table of immigration events, partitioned by `year` and `month`.
pub struct FactBuilder {
    immigrants: DataFrame,
}

impl FactBuilder {
    pub fn new(immigrants: DataFrame) -> Self {
        Self { immigrants }
    }
}

fn epoch_seconds(column: &str) -> Expr {
    cast(ident(column), DataType::Int64)
}

#[async_trait]
impl TableBuilder for FactBuilder {
    fn table_name(&self) -> &'static str {
        "fact_data"
    }

    fn sort_keys(&self) -> &'static [&'static str] {
        &["fact_id"]
    }

    fn partition_by(&self) -> &'static [&'static str] {
        &["year", "month"]
    }

    async fn build(&self, _ctx: &SessionContext) -> Result<DataFrame> {
        let fact = self.immigrants.clone().select(vec![
            ident("cicid").alias("fact_id"),
            ident("admnum").alias("admission_id"),
            ident("i94addr").alias("state_id"),
            ident("i94port").alias("airports_id"),
            ident("i94yr").alias("year"),
            ident("i94mon").alias("month"),
            ident("arrdate").alias("arrival_date"),
            ident("depdate").alias("departure_date"),
        ])?;

        // integer division truncates toward zero
        let duration = (epoch_seconds("departure_date") - epoch_seconds("arrival_date"))
            / lit(SECONDS_PER_DAY);

        let fact = fact
            .with_column("time_id", epoch_seconds("arrival_date"))?
            .with_column("duration", cast(duration, DataType::Int32))?
            .drop_columns(&["arrival_date"])?;

        drop_duplicates(fact, &["fact_id"])
    }
}
