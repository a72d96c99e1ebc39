use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use immigration_etl::logging::init_tracing;
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let matches = Command::new("immigration-etl")
        .version("1.0")
        .about("Builds the immigration star schema as parquet tables")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .default_value("dl.cfg")
                .help("INI file with credentials and dataset locations"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .get_matches();

    init_tracing(matches.get_flag("json-logs"));

    let config_path = matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or("dl.cfg");

    if let Err(e) = run(config_path).await {
        error!("ETL pipeline error: {:#}", e);
        process::exit(1);
    }
}

async fn run(config_path: &str) -> anyhow::Result<()> {
    info!(config = config_path, "Starting ETL pipeline");
    let summary = immigration_etl::run_etl_pipeline(config_path)
        .await
        .with_context(|| format!("pipeline run with '{}' failed", config_path))?;

    for table in &summary.tables {
        info!(table = table.table, rows = table.rows, location = %table.location, "Table written");
    }
    Ok(())
}
