//! DuckDB-backed connection
//!
//! Provides unified access to PostgreSQL, MySQL, SQLite and DuckDB files via
//! DuckDB extensions. The source database is attached read-only as
//! `source_db` and made the default catalog, so queries can name tables
//! without a prefix.

use super::connection::{Connection, Statement};
use super::params::{rewrite_placeholders, PositionalSql};
use super::source::DataSource;
use crate::error::{Error, Result};
use crate::types::{Binding, JsonObject, JsonValue};
use base64::Engine as _;
use duckdb::types::{TimeUnit, Value};

/// Database connection using DuckDB as the query engine
pub struct DuckDbConnection {
    /// DuckDB connection
    conn: duckdb::Connection,
    /// Parsed DSN (for logging)
    source: DataSource,
}

impl std::fmt::Debug for DuckDbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbConnection")
            .field("source", &self.source.masked())
            .finish_non_exhaustive()
    }
}

impl DuckDbConnection {
    /// Open a connection for a DSN
    pub fn open(dsn: &str) -> Result<Self> {
        let source = DataSource::parse(dsn)?;

        let conn = duckdb::Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;

        let connection = Self { conn, source };
        connection.attach()?;

        tracing::info!(source = %connection.connection_info(), "Connected to database");
        Ok(connection)
    }

    /// Open a fresh in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn attach(&self) -> Result<()> {
        if let Some(extension) = self.source.kind().extension() {
            self.conn
                .execute_batch(&format!("INSTALL {extension}; LOAD {extension};"))
                .map_err(|e| {
                    Error::config(format!("Failed to load {extension} extension: {e}"))
                })?;
        }

        if let Some(attach_sql) = self.source.attach_sql() {
            self.conn.execute_batch(&attach_sql).map_err(|e| {
                Error::config(format!(
                    "Failed to attach {}: {e}",
                    self.source.masked()
                ))
            })?;
        }

        if let Some(use_sql) = self.source.use_sql() {
            self.conn
                .execute_batch(use_sql)
                .map_err(|e| Error::config(format!("Failed to select source database: {e}")))?;
        }

        Ok(())
    }

    /// Run one or more statements without results
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| Error::query(format!("Failed to execute statements: {e}")))
    }

    /// Parsed source
    pub fn source(&self) -> &DataSource {
        &self.source
    }
}

impl Connection for DuckDbConnection {
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        let positional = rewrite_placeholders(sql);
        let stmt = self
            .conn
            .prepare(&positional.sql)
            .map_err(|e| Error::query(format!("Failed to prepare query: {e}")))?;

        Ok(Box::new(DuckDbStatement { stmt, positional }))
    }

    fn connection_info(&self) -> String {
        self.source.masked()
    }
}

/// Prepared DuckDB statement
struct DuckDbStatement<'conn> {
    stmt: duckdb::Statement<'conn>,
    positional: PositionalSql,
}

impl Statement for DuckDbStatement<'_> {
    fn execute(&mut self, bindings: &[Binding]) -> Result<Vec<JsonValue>> {
        let values = self.positional.values(bindings)?;

        let mut rows = self
            .stmt
            .query(duckdb::params_from_iter(values))
            .map_err(|e| Error::query(format!("Failed to execute query: {e}")))?;

        let columns = rows
            .as_ref()
            .map(|stmt| stmt.column_names())
            .unwrap_or_default();

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| Error::query(format!("Failed to read row: {e}")))?
        {
            let mut record = JsonObject::new();
            for (idx, column) in columns.iter().enumerate() {
                let value: Value = row
                    .get(idx)
                    .map_err(|e| Error::query(format!("Failed to read column '{column}': {e}")))?;
                record.insert(column.clone(), duckdb_value_to_json(value));
            }
            records.push(JsonValue::Object(record));
        }

        tracing::debug!(rows = records.len(), "Query returned rows");
        Ok(records)
    }
}

/// Convert DuckDB Value to JSON Value
pub fn duckdb_value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(i) => JsonValue::Number(i.into()),
        Value::SmallInt(i) => JsonValue::Number(i.into()),
        Value::Int(i) => JsonValue::Number(i.into()),
        Value::BigInt(i) => JsonValue::Number(i.into()),
        Value::HugeInt(i) => JsonValue::String(i.to_string()),
        Value::UTinyInt(i) => JsonValue::Number(i.into()),
        Value::USmallInt(i) => JsonValue::Number(i.into()),
        Value::UInt(i) => JsonValue::Number(i.into()),
        Value::UBigInt(i) => JsonValue::Number(i.into()),
        Value::Float(f) => {
            serde_json::Number::from_f64(f64::from(f)).map_or(JsonValue::Null, JsonValue::Number)
        }
        Value::Double(f) => serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number),
        Value::Text(s) => JsonValue::String(s),
        Value::Blob(b) => JsonValue::String(base64::engine::general_purpose::STANDARD.encode(b)),
        Value::Timestamp(unit, i) => {
            let (secs, nsecs) = split_epoch(unit, i);
            chrono::DateTime::from_timestamp(secs, nsecs)
                .map(|dt| JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()))
                .unwrap_or(JsonValue::Number(i.into()))
        }
        Value::Date32(d) => {
            // 719163 days from 1 CE to 1970-01-01
            chrono::NaiveDate::from_num_days_from_ce_opt(d + 719_163)
                .map(|date| JsonValue::String(date.format("%Y-%m-%d").to_string()))
                .unwrap_or(JsonValue::Number(d.into()))
        }
        Value::Time64(unit, t) => {
            let (secs, nsecs) = split_epoch(unit, t);
            JsonValue::String(format!(
                "{:02}:{:02}:{:02}.{:06}",
                secs / 3600,
                (secs % 3600) / 60,
                secs % 60,
                nsecs / 1000
            ))
        }
        other => JsonValue::String(format!("{other:?}")),
    }
}

/// Split a count of `unit` ticks into whole seconds and nanoseconds
fn split_epoch(unit: TimeUnit, ticks: i64) -> (i64, u32) {
    let per_second = match unit {
        TimeUnit::Second => 1,
        TimeUnit::Millisecond => 1_000,
        TimeUnit::Microsecond => 1_000_000,
        TimeUnit::Nanosecond => 1_000_000_000,
    };
    let nanos_per_tick = 1_000_000_000 / per_second;
    (
        ticks.div_euclid(per_second),
        (ticks.rem_euclid(per_second) * nanos_per_tick) as u32,
    )
}
