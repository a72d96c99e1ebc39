use crate::builders::{
    AdmissionsBuilder, AirportsBuilder, CountriesBuilder, FactBuilder, StatesBuilder,
    TableBuilder, TimeBuilder,
};
use crate::clean::load_immigrants;
use crate::reference::read_labels;
use crate::storage::{TableWriter, register_object_stores};
use crate::udf::register_udfs;
use crate::utils::frame::sort_by;
use common::Result;
use common::config::Settings;
use datafusion::prelude::SessionContext;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Rows written to one output table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub table: &'static str,
    pub location: String,
    pub rows: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub tables: Vec<TableSummary>,
}

impl RunSummary {
    pub fn rows(&self, table: &str) -> Option<u64> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.rows)
    }
}

/// One run of the immigration ETL against a single session.
pub struct Pipeline {
    settings: Settings,
    ctx: SessionContext,
}

impl Pipeline {
    /// Creates the session, registering the SAS date UDF and an object store
    /// for every S3 bucket named in the settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let ctx = SessionContext::new();
        register_udfs(&ctx)?;

        let stores = register_object_stores(&ctx, &settings.default, settings.locations())?;
        info!(object_stores = stores, "Session ready");

        Ok(Self { settings, ctx })
    }

    /// Builds and writes every table. The first failing stage aborts the run;
    /// tables written before it are left in place.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        let inputs = &self.settings.path;
        let outputs = &self.settings.output_path;

        let immigrants = load_immigrants(&self.ctx, &inputs.immigrants_path).await?;
        let labels: Arc<str> = read_labels(&self.ctx, &inputs.labels_path).await?.into();

        let stages = [
            stage(
                AirportsBuilder::new(labels.clone(), &inputs.airports_path),
                &outputs.airports_outpath,
            ),
            stage(StatesBuilder::new(&inputs.states_path), &outputs.states_outpath),
            stage(
                CountriesBuilder::new(labels, &inputs.countries_path),
                &outputs.countries_outpath,
            ),
            stage(
                AdmissionsBuilder::new(immigrants.clone()),
                &outputs.admissions_outpath,
            ),
            stage(TimeBuilder::new(immigrants.clone()), &outputs.time_outpath),
            stage(FactBuilder::new(immigrants), &outputs.fact_data_outpath),
        ];

        let writer = TableWriter::new(&self.ctx);
        let mut summary = RunSummary::default();

        for (builder, location) in stages {
            let table = builder.table_name();
            info!(table, location, "Building table");

            let df = builder.build(&self.ctx).await?;
            let df = sort_by(df, builder.sort_keys())?;
            let rows = writer
                .overwrite_parquet(df, location, builder.partition_by())
                .await?;

            summary.tables.push(TableSummary {
                table,
                location: location.to_string(),
                rows,
            });
        }

        info!(
            tables = summary.tables.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ETL pipeline finished"
        );
        Ok(summary)
    }
}

fn stage(builder: impl TableBuilder + 'static, location: &str) -> (Box<dyn TableBuilder>, &str) {
    (Box::new(builder), location)
}
