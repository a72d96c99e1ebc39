use super::TableBuilder;
use async_trait::async_trait;
use common::Result;
use datafusion::arrow::datatypes::DataType;
use datafusion::functions::expr_fn::date_part;
use datafusion::prelude::*;

/// Time dimension keyed by arrival date.
pub struct TimeBuilder {
    immigrants: DataFrame,
}

impl TimeBuilder {
    pub fn new(immigrants: DataFrame) -> Self {
        Self { immigrants }
    }
}

fn calendar_part(part: &str) -> Expr {
    cast(date_part(lit(part), ident("arrdate")), DataType::Int32)
}

#[async_trait]
impl TableBuilder for TimeBuilder {
    fn table_name(&self) -> &'static str {
        "time"
    }

    fn sort_keys(&self) -> &'static [&'static str] {
        &["time_id"]
    }

    async fn build(&self, _ctx: &SessionContext) -> Result<DataFrame> {
        let dates = self
            .immigrants
            .clone()
            .select(vec![ident("arrdate")])?
            .distinct()?;

        Ok(dates.select(vec![
            ident("arrdate").alias("date"),
            cast(ident("arrdate"), DataType::Int64).alias("time_id"),
            calendar_part("year").alias("year"),
            calendar_part("month").alias("month"),
            calendar_part("quarter").alias("quarter"),
            calendar_part("week").alias("year_week"),
        ])?)
    }
}
