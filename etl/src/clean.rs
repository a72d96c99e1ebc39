use crate::udf::sas_to_date_udf;
use common::{Error, Result};
use datafusion::arrow::datatypes::DataType;
use datafusion::prelude::*;
use tracing::{debug, info};

/// Columns narrowed to 32-bit integers.
pub const INTEGER_COLUMNS: [&str; 7] = [
    "i94yr", "i94mon", "i94cit", "i94res", "i94mode", "biryear", "i94visa",
];

/// Identifier columns widened to 64-bit integers.
pub const LONG_COLUMNS: [&str; 2] = ["admnum", "cicid"];

/// SAS day-number columns converted to timestamps.
pub const DATE_COLUMNS: [&str; 2] = ["arrdate", "depdate"];

/// Reads the raw immigration parquet source and cleans it.
///
/// The result is materialised in memory: the admissions, time and fact
/// builders all read it, and the source should only be scanned once.
pub async fn load_immigrants(ctx: &SessionContext, path: &str) -> Result<DataFrame> {
    info!(path, "Loading immigration dataset");
    let raw = ctx.read_parquet(path, ParquetReadOptions::default()).await?;
    let cleaned = clean_immigrants(raw)?.cache().await?;
    Ok(cleaned)
}

/// Normalises column types and drops rows without a departure date.
///
/// Applying this to an already cleaned frame changes nothing: the integer
/// casts are no-ops and timestamp columns are passed through.
pub fn clean_immigrants(df: DataFrame) -> Result<DataFrame> {
    check_required_columns(&df)?;

    let sas_to_date = sas_to_date_udf();
    let exprs: Vec<Expr> = df
        .schema()
        .fields()
        .iter()
        .map(|field| {
            let name = field.name().as_str();
            if INTEGER_COLUMNS.contains(&name) {
                cast(ident(name), DataType::Int32).alias(name)
            } else if LONG_COLUMNS.contains(&name) {
                cast(ident(name), DataType::Int64).alias(name)
            } else if DATE_COLUMNS.contains(&name) {
                match field.data_type() {
                    DataType::Timestamp(_, _) => ident(name),
                    _ => sas_to_date
                        .call(vec![cast(ident(name), DataType::Float64)])
                        .alias(name),
                }
            } else {
                ident(name)
            }
        })
        .collect();

    debug!(columns = exprs.len(), "Normalising immigration column types");
    Ok(df.select(exprs)?.filter(ident("depdate").is_not_null())?)
}

fn check_required_columns(df: &DataFrame) -> Result<()> {
    let missing: Vec<&str> = INTEGER_COLUMNS
        .iter()
        .chain(LONG_COLUMNS.iter())
        .chain(DATE_COLUMNS.iter())
        .copied()
        .filter(|name| df.schema().field_with_unqualified_name(name).is_err())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::SchemaValidation(format!(
            "immigration dataset is missing columns: {}",
            missing.join(", ")
        )))
    }
}
