//! Fixtures shared by the unit tests.

use datafusion::arrow::array::{ArrayRef, Float64Array, StringArray};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::prelude::DataFrame;
use std::path::Path;
use std::sync::Arc;

/// Builds a batch of nullable Utf8 columns.
pub fn batch_of(columns: Vec<(&str, Vec<Option<&str>>)>) -> RecordBatch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, _)| Field::new(*name, DataType::Utf8, true))
        .collect();
    let arrays: Vec<ArrayRef> = columns
        .into_iter()
        .map(|(_, values)| Arc::new(StringArray::from(values)) as ArrayRef)
        .collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

/// Every value of `name` across `batches`, rendered as text.
pub fn column_strings(batches: &[RecordBatch], name: &str) -> Vec<Option<String>> {
    let mut values = Vec::new();
    for batch in batches {
        let index = batch.schema().index_of(name).unwrap();
        let as_text = cast(batch.column(index), &DataType::Utf8).unwrap();
        let strings = as_text.as_any().downcast_ref::<StringArray>().unwrap();
        values.extend(strings.iter().map(|v| v.map(str::to_string)));
    }
    values
}

/// Every value of `name` across `batches`, cast to f64.
pub fn column_f64(batches: &[RecordBatch], name: &str) -> Vec<Option<f64>> {
    let mut values = Vec::new();
    for batch in batches {
        let index = batch.schema().index_of(name).unwrap();
        let as_float = cast(batch.column(index), &DataType::Float64).unwrap();
        let floats = as_float.as_any().downcast_ref::<Float64Array>().unwrap();
        values.extend(floats.iter());
    }
    values
}

pub fn row_count(batches: &[RecordBatch]) -> usize {
    batches.iter().map(|b| b.num_rows()).sum()
}

/// Writes `contents` under `dir` and returns the path as a string.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.schema().fields().iter().map(|f| f.name().clone()).collect()
}
