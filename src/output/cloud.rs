//! S3 output support

use super::sink::ExportSink;
use super::target::{randomize_path, ExportTarget, Protocol};
use super::writer::{encode_csv, CsvWriterConfig};
use crate::error::{Error, Result};
use crate::extract::ExportRow;
use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;

/// Writes CSV as a single object to an S3 bucket
#[derive(Debug, Clone)]
pub struct S3Sink {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    bucket: String,
    /// Object key within the bucket
    key: String,
    randomize: bool,
    csv: CsvWriterConfig,
}

impl S3Sink {
    /// Create a sink from an `s3://bucket/key` URI
    ///
    /// Credentials and region come from the standard `AWS_*` environment
    /// variables.
    pub fn from_uri(uri: &str) -> Result<Self> {
        Self::from_target(&ExportTarget::parse(uri)?)
    }

    pub(crate) fn from_target(target: &ExportTarget) -> Result<Self> {
        if target.protocol() != Protocol::S3 {
            return Err(Error::config(format!(
                "Expected an s3:// export path, got '{target}'"
            )));
        }
        let (bucket, key) = split_bucket_key(target.path())?;

        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create s3 client: {e}")))?;

        Ok(Self::with_store(Arc::new(store), bucket, key))
    }

    /// Create a sink over an existing object store
    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            key: key.into(),
            randomize: true,
            csv: CsvWriterConfig::default(),
        }
    }

    /// Enable or disable key randomization
    #[must_use]
    pub fn with_randomize(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    /// Set CSV encoding options
    #[must_use]
    pub fn with_csv_config(mut self, csv: CsvWriterConfig) -> Self {
        self.csv = csv;
        self
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Configured key, before randomization
    pub fn key(&self) -> &str {
        &self.key
    }

    fn resolve_key(&self) -> String {
        if self.randomize {
            randomize_path(&self.key)
        } else {
            self.key.clone()
        }
    }
}

#[async_trait]
impl ExportSink for S3Sink {
    fn verify_writable(&self) -> Result<()> {
        Ok(())
    }

    fn output_path(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.resolve_key())
    }

    async fn write_csv(&self, header: &[String], rows: &[ExportRow]) -> Result<String> {
        let data = encode_csv(header, rows, Some(&self.csv))?;
        let key = self.resolve_key();
        let location = ObjectPath::from(key.as_str());
        let size = data.len();

        self.store
            .put(&location, data.into())
            .await
            .map_err(|e| {
                tracing::error!(bucket = %self.bucket, key = %key, error = %e, "S3 upload failed");
                Error::output(format!("Failed to write s3://{}/{key}", self.bucket))
            })?;

        let full_path = format!("s3://{}/{key}", self.bucket);
        tracing::info!(path = %full_path, rows = rows.len(), bytes = size, "Wrote CSV export");
        Ok(full_path)
    }
}

fn split_bucket_key(path: &str) -> Result<(&str, &str)> {
    match path.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.trim_matches('/').is_empty() => {
            Ok((bucket, key.trim_start_matches('/')))
        }
        _ => Err(Error::config(format!(
            "S3 export path must name a bucket and a key, e.g. 's3://bucket/out.csv', got 's3://{path}'"
        ))),
    }
}
