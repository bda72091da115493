//! Execution engine module
//!
//! Orchestrates one export: validate, query, extract, write.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Exporter` - Runs the export pipeline against a connection and a sink
//! - `ExportConfig` - What to export and how
//! - `ExportOutcome` - Where the CSV went and which rows were skipped

mod types;

pub use types::{ExportConfig, ExportOutcome, DEFAULT_DATA_FIELD};

use crate::database::{Connection, DuckDbConnection};
use crate::dates::{DateRangeValidator, ValidatedRange};
use crate::error::{Error, Result};
use crate::extract::{Extraction, RowExtractor};
use crate::output::ExportSink;
use crate::query::{QueryBuilder, SelectQuery};
use crate::types::JsonValue;
use std::time::Instant;

/// Exports a table's JSON payload column to CSV
///
/// The connection is opened lazily from the DSN unless one was injected.
/// Any failure aborts the run; nothing is retried.
pub struct Exporter {
    /// What to export
    config: ExportConfig,
    /// Connection string used when no connection is injected
    dsn: Option<String>,
    /// Database connection
    connection: Option<Box<dyn Connection>>,
    /// Export destination
    sink: Option<Box<dyn ExportSink>>,
}

impl Exporter {
    /// Create a new exporter
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            dsn: None,
            connection: None,
            sink: None,
        }
    }

    /// Set the DSN to connect with
    #[must_use]
    pub fn with_dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    /// Use an existing connection
    #[must_use]
    pub fn with_connection(mut self, connection: Box<dyn Connection>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Set the export sink
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn ExportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the connection
    pub fn set_connection(&mut self, connection: Box<dyn Connection>) {
        self.connection = Some(connection);
    }

    /// Replace the export sink
    pub fn set_sink(&mut self, sink: Box<dyn ExportSink>) {
        self.sink = Some(sink);
    }

    /// Get the configuration
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Validate the date range, if validation is enabled
    pub fn validate_range(&self) -> Result<Option<ValidatedRange>> {
        if !self.config.validate_dates {
            return Ok(None);
        }
        DateRangeValidator::new()
            .with_parser(self.config.parser())
            .validate(&self.config.criteria)
    }

    /// Validate and build the query without running it
    pub fn plan(&self) -> Result<SelectQuery> {
        self.validate_range()?;
        self.build_query()
    }

    /// Run the full export
    pub async fn run(&mut self) -> Result<ExportOutcome> {
        let started = Instant::now();

        if self.sink.is_none() {
            return Err(Error::config("no export sink configured"));
        }
        self.ensure_connection()?;

        let sink = self.sink()?;
        sink.verify_writable()?;

        tracing::info!(
            table = %self.config.table,
            criteria = self.config.criteria.len(),
            "Starting export"
        );

        let range = self.validate_range()?;
        let query = self.build_query()?;
        let records = self.fetch(&query)?;
        tracing::info!(rows = records.len(), "Fetched rows");

        let extraction = self.extractor(range.as_ref()).extract_rows(&records)?;
        self.write(sink, extraction, records.len(), started).await
    }

    /// Export an already-fetched result set
    ///
    /// `records` must be a JSON array of row objects, as a query would
    /// return them.
    pub async fn export_records(&self, records: &JsonValue) -> Result<ExportOutcome> {
        let started = Instant::now();

        let sink = self.sink()?;
        sink.verify_writable()?;

        let fetched = records.as_array().map_or(0, Vec::len);
        let extraction = self.extractor(None).extract(records)?;
        self.write(sink, extraction, fetched, started).await
    }

    fn sink(&self) -> Result<&dyn ExportSink> {
        self.sink
            .as_deref()
            .ok_or_else(|| Error::config("no export sink configured"))
    }

    fn ensure_connection(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }
        let dsn = self
            .dsn
            .as_deref()
            .ok_or_else(|| Error::config("no database connection configured"))?;
        let connection = DuckDbConnection::open(dsn)?;
        self.connection = Some(Box::new(connection));
        Ok(())
    }

    fn build_query(&self) -> Result<SelectQuery> {
        QueryBuilder::new(&self.config.table)
            .with_date_column(&self.config.date_column)
            .with_parser(self.config.parser())
            .build(&self.config.criteria)
    }

    fn fetch(&self, query: &SelectQuery) -> Result<Vec<JsonValue>> {
        let connection = self
            .connection
            .as_deref()
            .ok_or_else(|| Error::config("no database connection configured"))?;

        tracing::debug!(sql = %query.sql, bindings = %query.bindings_json(), "Executing query");

        connection
            .prepare(&query.sql)
            .and_then(|mut stmt| stmt.execute(&query.bindings))
            .map_err(|e| {
                tracing::error!(
                    sql = %query.sql,
                    bindings = %query.bindings_json(),
                    source = %connection.connection_info(),
                    error = %e,
                    "Query failed"
                );
                Error::query(format!(
                    "failed to select rows from '{}'",
                    self.config.table
                ))
            })
    }

    fn extractor(&self, range: Option<&ValidatedRange>) -> RowExtractor {
        let display_offset = range.map_or(self.config.default_offset, |r| r.display_offset);
        RowExtractor::new(&self.config.data_field)
            .with_created_field(self.config.created_field)
            .with_date_column(&self.config.date_column)
            .with_parser(self.config.parser())
            .with_display_offset(display_offset)
    }

    async fn write(
        &self,
        sink: &dyn ExportSink,
        extraction: Extraction,
        fetched: usize,
        started: Instant,
    ) -> Result<ExportOutcome> {
        let path = sink.write_csv(&extraction.header, &extraction.rows).await?;

        let outcome = ExportOutcome {
            path,
            rows_fetched: fetched,
            rows_written: extraction.rows.len(),
            header: extraction.header,
            diverged: extraction.diverged,
            issues: extraction.issues,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        tracing::info!(
            path = %outcome.path,
            rows = outcome.rows_written,
            issues = outcome.issues.len(),
            duration_ms = outcome.duration_ms,
            "Export complete"
        );
        Ok(outcome)
    }
}
