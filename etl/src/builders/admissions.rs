use super::TableBuilder;
use crate::utils::frame::{drop_duplicates, rename_columns};
use async_trait::async_trait;
use common::Result;
use datafusion::prelude::*;

const ADMISSION_COLUMNS: [&str; 12] = [
    "admnum", "visatype", "insnum", "dtaddto", "gender", "biryear", "i94cit", "i94res", "i94mode",
    "airline", "fltno", "occup",
];

const ADMISSION_RENAMES: [(&str, &str); 6] = [
    ("admnum", "admission_id"),
    ("occup", "occupation"),
    ("fltno", "flight_number"),
    ("i94cit", "city"),
    ("i94res", "resident_city"),
    ("i94mode", "mode"),
];

/// Admissions dimension, one row per admission number.
pub struct AdmissionsBuilder {
    immigrants: DataFrame,
}

impl AdmissionsBuilder {
    pub fn new(immigrants: DataFrame) -> Self {
        Self { immigrants }
    }
}

#[async_trait]
impl TableBuilder for AdmissionsBuilder {
    fn table_name(&self) -> &'static str {
        "admissions"
    }

    fn sort_keys(&self) -> &'static [&'static str] {
        &["admission_id"]
    }

    async fn build(&self, _ctx: &SessionContext) -> Result<DataFrame> {
        let columns: Vec<Expr> = ADMISSION_COLUMNS.iter().map(|c| ident(*c)).collect();
        let admissions = self.immigrants.clone().select(columns)?;
        let admissions = drop_duplicates(admissions, &["admnum"])?;
        rename_columns(admissions, &ADMISSION_RENAMES)
    }
}
