pub mod builders;
pub mod clean;
pub mod logging;
pub mod pipeline;
pub mod reference;
pub mod storage;
pub mod udf;
pub mod utils;

use common::Result;
use common::config::Settings;
use pipeline::{Pipeline, RunSummary};

/// Loads the settings at `config_path` and runs the complete ETL.
pub async fn run_etl_pipeline(config_path: &str) -> Result<RunSummary> {
    let settings = Settings::new(config_path)?;
    Pipeline::new(settings)?.run().await
}
