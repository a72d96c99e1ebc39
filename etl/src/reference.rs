//! Code → name lookups recovered from the I-94 SAS labels description file.
//!
//! The file is a SAS `proc format` listing. Each `value` block is a run of
//! `code = 'name'` lines terminated by `;`, so a section is located with a
//! pattern such as `I94PORT[^;]+` and every assignment line inside it becomes
//! one row.

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use datafusion::datasource::listing::ListingTableUrl;
use datafusion::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Section holding the port of entry codes.
pub const PORTS_SECTION: &str = "I94PORT[^;]+";

/// Section holding the country of citizenship / residence codes.
pub const COUNTRIES_SECTION: &str = "I94CIT & I94RES[^;]+";

/// One extracted section. Codes are unique; a repeated code keeps the value of
/// its last occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    entries: BTreeMap<String, String>,
}

impl ReferenceTable {
    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn schema() -> Schema {
        Schema::new(vec![
            Field::new("code", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
        ])
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let codes: ArrayRef = Arc::new(StringArray::from_iter_values(self.entries.keys()));
        let names: ArrayRef = Arc::new(StringArray::from_iter_values(self.entries.values()));
        Ok(RecordBatch::try_new(
            Arc::new(Self::schema()),
            vec![codes, names],
        )?)
    }

    /// Loads the table into the session as a `code`, `name` DataFrame.
    pub fn to_dataframe(&self, ctx: &SessionContext) -> Result<DataFrame> {
        Ok(ctx.read_batch(self.to_record_batch()?)?)
    }
}

/// Extracts the first section of `document` matched by `pattern`.
pub fn extract_section(document: &str, pattern: &str) -> Result<ReferenceTable> {
    let regex = Regex::new(pattern)?;
    let section = regex
        .find(document)
        .ok_or_else(|| Error::NotFound(format!("no section matches pattern '{}'", pattern)))?;

    let mut entries = BTreeMap::new();
    for line in section.as_str().lines() {
        if let Some((code, name)) = line.split_once('=') {
            entries.insert(clean_token(code), clean_token(name));
        }
    }

    debug!(pattern, rows = entries.len(), "Extracted reference section");
    Ok(ReferenceTable { entries })
}

fn clean_token(raw: &str) -> String {
    raw.replace(['\'', '\t'], "").trim_matches(' ').to_string()
}

/// Reads the labels document through the session's object store, so local
/// paths and registered `s3://` buckets are both supported.
pub async fn read_labels(ctx: &SessionContext, location: &str) -> Result<String> {
    let url = ListingTableUrl::parse(location)?;
    let store = ctx.runtime_env().object_store(url.object_store())?;

    let bytes = match store.get(url.prefix()).await {
        Ok(object) => object.bytes().await?,
        Err(object_store::Error::NotFound { .. }) => {
            return Err(Error::NotFound(format!("labels file '{}'", location)));
        }
        Err(e) => return Err(e.into()),
    };

    String::from_utf8(bytes.to_vec()).map_err(|e| {
        Error::InvalidInput(format!("labels file '{}' is not UTF-8: {}", location, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::write_fixture;

    const LABELS: &str = "/* I94YR - 4 digit year */\n\
value i94cntyl\n\
   582 =  'MEXICO Air Sea, and Not Reported (I-94, no land arrivals)'\n\
   236 =  'AFGHANISTAN'\n\
   101 =  'ALBANIA'\n\
;\n\
\n\
/* I94PORT - This format shows all the valid and invalid codes for processing */\n\
value $i94prtl\n\
\t'ALC'\t=\t'ALCAN, AK             '\n\
\t'ANC'\t=\t'ANCHORAGE, AK         '\n\
\t'XXX'\t=\t'NOT REPORTED/UNKNOWN  '\n\
\t'ANC'\t=\t'ANCHORAGE INTL, AK    '\n\
;\n";

    #[test]
    fn test_extracts_port_section() {
        let table = extract_section(LABELS, PORTS_SECTION).unwrap();

        assert_eq!(table.to_record_batch().unwrap().num_rows(), 3);
        assert_eq!(table.get("ALC"), Some("ALCAN, AK"));
        assert_eq!(table.get("XXX"), Some("NOT REPORTED/UNKNOWN"));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let table = extract_section(LABELS, PORTS_SECTION).unwrap();
        assert_eq!(table.get("ANC"), Some("ANCHORAGE INTL, AK"));
    }

    #[test]
    fn test_skips_lines_without_separator() {
        let doc = "value i94cntyl\n  I94CIT & I94RES\n   236 =  'AFGHANISTAN'\nnot an entry\n;";
        let table = extract_section(doc, COUNTRIES_SECTION).unwrap();

        assert_eq!(table.to_record_batch().unwrap().num_rows(), 1);
        assert_eq!(table.get("236"), Some("AFGHANISTAN"));
    }

    #[test]
    fn test_missing_section_is_not_found() {
        let err = extract_section(LABELS, COUNTRIES_SECTION).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = extract_section(LABELS, "I94PORT[").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_to_dataframe_has_code_and_name() {
        let ctx = SessionContext::new();
        let table = extract_section(LABELS, PORTS_SECTION).unwrap();

        let df = table.to_dataframe(&ctx).unwrap();
        let names: Vec<String> = df.schema().fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(names, vec!["code", "name"]);
        assert_eq!(df.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reads_labels_from_local_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "I94_SAS_Labels_Descriptions.SAS", LABELS);
        let ctx = SessionContext::new();

        let document = read_labels(&ctx, &path).await.unwrap();
        assert_eq!(document, LABELS);
    }

    #[tokio::test]
    async fn test_missing_labels_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.SAS").to_string_lossy().into_owned();
        let ctx = SessionContext::new();

        let err = read_labels(&ctx, &path).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "{}", err);
    }

    #[tokio::test]
    async fn test_non_utf8_labels_are_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.SAS");
        std::fs::write(&path, [b'A', b'=', 0xff, 0xfe]).unwrap();
        let ctx = SessionContext::new();

        let err = read_labels(&ctx, &path.to_string_lossy()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "{}", err);
    }
}
