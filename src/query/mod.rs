//! Query module
//!
//! Turns a table name and a criteria map into a parameterized SELECT.
//!
//! # Rules
//!
//! - scalar value: `"col" = :col`
//! - list value: `"col" IN (:col_0, :col_1, ...)`
//! - `startDate`: `"created" >= :startDate` (start of day)
//! - `endDate`: `"created" <= :endDate` (end of day)
//!
//! Clauses are joined with `AND` in criteria order.

mod builder;

pub use builder::{quote_identifier, QueryBuilder, SelectQuery};
