//! Database access via DuckDB
//!
//! This module provides database connectivity using DuckDB as the query engine.
//! DuckDB can connect to PostgreSQL, MySQL, SQLite, and other databases.
//!
//! The exporter talks to the [`Connection`] and [`Statement`] traits, so tests
//! can swap in any implementation.

mod connection;
mod engine;
mod params;
mod source;

pub use connection::{Connection, Statement};
pub use engine::{duckdb_value_to_json, DuckDbConnection};
pub use params::{json_to_duckdb, rewrite_placeholders, PositionalSql};
pub use source::{DataSource, DatabaseKind};
