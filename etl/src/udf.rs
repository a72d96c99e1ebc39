use chrono::{Duration, NaiveDate, NaiveDateTime};
use common::Result;
use datafusion::arrow::array::TimestampSecondArray;
use datafusion::arrow::datatypes::{DataType, TimeUnit};
use datafusion::common::DataFusionError;
use datafusion::common::cast::as_float64_array;
use datafusion::execution::context::SessionContext;
use datafusion::logical_expr::{ColumnarValue, ScalarUDF, Volatility, create_udf};
use std::sync::Arc;

pub const SAS_TO_DATE: &str = "sas_to_date";

/// Type produced by [`sas_to_date_udf`].
pub fn sas_timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Second, None)
}

/// Registers all UDFs with the SessionContext
pub fn register_udfs(ctx: &SessionContext) -> Result<()> {
    ctx.register_udf(sas_to_date_udf());
    Ok(())
}

/// SAS day number (Float64) to a second-resolution timestamp.
pub fn sas_to_date_udf() -> ScalarUDF {
    create_udf(
        SAS_TO_DATE,
        vec![DataType::Float64],
        sas_timestamp_type(),
        Volatility::Immutable,
        Arc::new(|args| {
            convert_sas_dates(args).map_err(|e| DataFusionError::Internal(e.to_string()))
        }),
    )
}

/// Converts a SAS day number (days since 1960-01-01) to a calendar timestamp.
///
/// Null, zero and NaN inputs have no date. Fractional days are truncated.
pub fn sas_to_date(days: Option<f64>) -> Option<NaiveDateTime> {
    let days = days.filter(|d| *d != 0.0 && !d.is_nan())?;
    let epoch = NaiveDate::from_ymd_opt(1960, 1, 1)?.and_hms_opt(0, 0, 0)?;
    epoch.checked_add_signed(Duration::try_days(days.trunc() as i64)?)
}

fn convert_sas_dates(args: &[ColumnarValue]) -> Result<ColumnarValue> {
    let arrays = ColumnarValue::values_to_arrays(args)?;
    let days = as_float64_array(&arrays[0])?;

    let result: TimestampSecondArray = days
        .iter()
        .map(|d| sas_to_date(d).map(|dt| dt.and_utc().timestamp()))
        .collect();

    Ok(ColumnarValue::Array(Arc::new(result)))
}
