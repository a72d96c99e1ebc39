use common::config::Credentials;
use common::{Error, Result};
use datafusion::arrow::datatypes::DataType;
use datafusion::common::cast::as_uint64_array;
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::datasource::listing::ListingTableUrl;
use datafusion::prelude::*;
use futures::TryStreamExt;
use object_store::ObjectMeta;
use object_store::aws::AmazonS3Builder;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const S3_SCHEMES: [&str; 2] = ["s3", "s3a"];

/// Registers an S3 object store with the session for every bucket referenced
/// by `locations`. Local paths need no registration.
pub fn register_object_stores<'a>(
    ctx: &SessionContext,
    credentials: &Credentials,
    locations: impl IntoIterator<Item = &'a str>,
) -> Result<usize> {
    let buckets: BTreeSet<(String, String)> = locations
        .into_iter()
        .filter_map(|location| Url::parse(location).ok())
        .filter(|url| S3_SCHEMES.contains(&url.scheme()))
        .filter_map(|url| {
            url.host_str()
                .map(|bucket| (url.scheme().to_string(), bucket.to_string()))
        })
        .collect();

    for (scheme, bucket) in &buckets {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region(&credentials.aws_region)
            .with_access_key_id(&credentials.aws_access_key_id)
            .with_secret_access_key(&credentials.aws_secret_access_key);

        if let Some(endpoint) = &credentials.aws_endpoint {
            builder = builder.with_endpoint(endpoint).with_allow_http(true);
        }

        let url = Url::parse(&format!("{}://{}", scheme, bucket))?;
        ctx.runtime_env()
            .register_object_store(&url, Arc::new(builder.build()?));
        debug!(%url, "Registered object store");
    }

    Ok(buckets.len())
}

/// Writes tables as parquet directories, replacing whatever was there before.
pub struct TableWriter<'a> {
    ctx: &'a SessionContext,
}

impl<'a> TableWriter<'a> {
    pub fn new(ctx: &'a SessionContext) -> Self {
        Self { ctx }
    }

    /// Replaces the contents of `location` with `df` and returns the number
    /// of rows written.
    ///
    /// The plan is executed into memory before anything is deleted, so an
    /// execution error leaves the previous table in place.
    ///
    /// Hive partition values are written as text directory names, so
    /// partition columns are cast to strings first.
    pub async fn overwrite_parquet(
        &self,
        df: DataFrame,
        location: &str,
        partition_by: &[&str],
    ) -> Result<u64> {
        let location = as_directory(location);

        let mut df = df;
        for column in partition_by {
            df = df.with_column(column, cast(ident(*column), DataType::Utf8))?;
        }
        let df = df.cache().await?;

        let removed = self.clear_location(&location).await?;
        if removed > 0 {
            debug!(location, removed, "Removed previous table contents");
        }

        let options = DataFrameWriteOptions::new()
            .with_single_file_output(false)
            .with_partition_by(partition_by.iter().map(|c| c.to_string()).collect());

        let results = df.write_parquet(&location, options, None).await?;
        let mut rows = 0;
        for batch in &results {
            let counts = as_uint64_array(batch.column(0))?;
            rows += counts.iter().flatten().sum::<u64>();
        }

        info!(location, rows, "Wrote parquet table");
        Ok(rows)
    }

    /// Deletes every object under `location`. A missing location is empty.
    async fn clear_location(&self, location: &str) -> Result<usize> {
        let table_url = ListingTableUrl::parse(location)?;
        let store = self.ctx.runtime_env().object_store(table_url.object_store())?;

        let existing: Vec<ObjectMeta> = match store.list(Some(table_url.prefix())).try_collect().await {
            Ok(objects) => objects,
            Err(object_store::Error::NotFound { .. }) => Vec::new(),
            Err(e) => return Err(Error::from(e)),
        };

        for object in &existing {
            store.delete(&object.location).await?;
        }
        Ok(existing.len())
    }
}

fn as_directory(location: &str) -> String {
    if location.ends_with('/') {
        location.to_string()
    } else {
        format!("{}/", location)
    }
}
