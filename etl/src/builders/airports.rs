use super::TableBuilder;
use crate::reference::{PORTS_SECTION, extract_section};
use crate::utils::frame::{drop_duplicates, read_csv, rename_columns};
use async_trait::async_trait;
use common::Result;
use datafusion::functions::expr_fn::{btrim, nullif, split_part};
use datafusion::prelude::*;
use std::sync::Arc;

/// Airport dimension: every I-94 port code with its city and state, left
/// joined to the external airport-codes table on IATA code.
pub struct AirportsBuilder {
    labels: Arc<str>,
    airports_path: String,
}

impl AirportsBuilder {
    pub fn new(labels: Arc<str>, airports_path: impl Into<String>) -> Self {
        Self {
            labels,
            airports_path: airports_path.into(),
        }
    }

    fn ports(&self, ctx: &SessionContext) -> Result<DataFrame> {
        let ports = extract_section(&self.labels, PORTS_SECTION)?.to_dataframe(ctx)?;
        let segment = |index: i64| btrim(vec![split_part(ident("name"), lit(","), lit(index))]);

        Ok(ports.select(vec![
            ident("code"),
            segment(1).alias("city"),
            nullif(segment(2), lit("")).alias("state"),
        ])?)
    }

    async fn airports(&self, ctx: &SessionContext) -> Result<DataFrame> {
        let airports = read_csv(ctx, &self.airports_path, b',').await?;
        let airports = airports.filter(ident("iata_code").is_not_null())?;
        drop_duplicates(airports, &["iata_code"])
    }
}

#[async_trait]
impl TableBuilder for AirportsBuilder {
    fn table_name(&self) -> &'static str {
        "airports"
    }

    fn sort_keys(&self) -> &'static [&'static str] {
        &["airport_id"]
    }

    async fn build(&self, ctx: &SessionContext) -> Result<DataFrame> {
        let ports = self.ports(ctx)?.alias("us_ports")?;
        let airports = self.airports(ctx).await?.alias("airports")?;

        let joined = ports.join_on(
            airports,
            JoinType::Left,
            [col("us_ports.code").eq(col("airports.iata_code"))],
        )?;
        let joined = rename_columns(joined, &[("code", "airport_id")])?;

        drop_duplicates(joined, &["airport_id"])
    }
}
