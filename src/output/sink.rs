//! Export sinks
//!
//! A sink receives the final header and rows and writes one CSV object.

use super::cloud::S3Sink;
use super::target::{randomize_path, ExportTarget, Protocol};
use super::writer::{encode_csv, CsvWriterConfig};
use crate::error::{Error, Result};
use crate::extract::ExportRow;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination for exported CSV
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Fail fast if the destination cannot be written
    fn verify_writable(&self) -> Result<()>;

    /// Resolved destination path
    ///
    /// With randomization enabled every call yields a new path.
    fn output_path(&self) -> String;

    /// Encode and write the CSV, returning where it was written
    async fn write_csv(&self, header: &[String], rows: &[ExportRow]) -> Result<String>;
}

/// Build a sink for an export path URI
pub fn build_sink(uri: &str, randomize: bool) -> Result<Box<dyn ExportSink>> {
    build_sink_with_config(uri, randomize, CsvWriterConfig::default())
}

/// Build a sink for an export path URI with explicit CSV settings
pub fn build_sink_with_config(
    uri: &str,
    randomize: bool,
    csv: CsvWriterConfig,
) -> Result<Box<dyn ExportSink>> {
    let target = ExportTarget::parse(uri)?;
    tracing::debug!(target = %target, randomize, "Building export sink");

    match target.protocol() {
        Protocol::File => Ok(Box::new(
            FileSystemSink::new(target.path())
                .with_randomize(randomize)
                .with_csv_config(csv),
        )),
        Protocol::S3 => Ok(Box::new(
            S3Sink::from_target(&target)?
                .with_randomize(randomize)
                .with_csv_config(csv),
        )),
    }
}

// ============================================================================
// Filesystem
// ============================================================================

/// Writes CSV to the local filesystem
#[derive(Debug, Clone)]
pub struct FileSystemSink {
    path: String,
    randomize: bool,
    csv: CsvWriterConfig,
}

impl FileSystemSink {
    /// Create a sink writing to `path`; randomization is on by default
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            randomize: true,
            csv: CsvWriterConfig::default(),
        }
    }

    /// Create a sink from a `file://` URI
    pub fn from_uri(uri: &str) -> Result<Self> {
        let target = ExportTarget::parse(uri)?;
        if target.protocol() != Protocol::File {
            return Err(Error::config(format!(
                "Expected a file:// export path, got '{target}'"
            )));
        }
        Ok(Self::new(target.path()))
    }

    /// Enable or disable file name randomization
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

    /// Configured path, before randomization
    pub fn path(&self) -> &str {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match Path::new(&self.path).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

#[async_trait]
impl ExportSink for FileSystemSink {
    fn verify_writable(&self) -> Result<()> {
        let dir = self.parent_dir();

        // Only creating a file shows whether this process may write here
        if let Err(e) = tempfile::Builder::new()
            .prefix(".writable-")
            .tempfile_in(&dir)
        {
            tracing::error!(path = %dir.display(), error = %e, "Export directory missing or not writable");
            return Err(Error::unwritable(&self.path));
        }
        Ok(())
    }

    fn output_path(&self) -> String {
        if self.randomize {
            randomize_path(&self.path)
        } else {
            self.path.clone()
        }
    }

    async fn write_csv(&self, header: &[String], rows: &[ExportRow]) -> Result<String> {
        let data = encode_csv(header, rows, Some(&self.csv))?;
        let path = self.output_path();

        // The temp file is removed on drop unless persisted
        let mut temp = tempfile::Builder::new()
            .prefix(".export-")
            .suffix(".tmp")
            .tempfile_in(self.parent_dir())
            .map_err(|e| {
                tracing::error!(path = %path, error = %e, "Failed to create export file");
                Error::unwritable(&path)
            })?;

        if let Err(e) = temp.write_all(&data).and_then(|()| temp.flush()) {
            tracing::error!(path = %temp.path().display(), error = %e, "Failed to write export file");
            return Err(Error::unwritable(&path));
        }
        if let Err(e) = temp.persist(&path) {
            tracing::error!(path = %path, error = %e.error, "Failed to move export file into place");
            return Err(Error::unwritable(&path));
        }

        tracing::info!(path = %path, rows = rows.len(), bytes = data.len(), "Wrote CSV export");
        Ok(path)
    }
}
