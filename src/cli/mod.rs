//! CLI module
//!
//! Command-line interface for running exports.
//!
//! # Commands
//!
//! - `export` - Query the database and write the CSV
//! - `convert` - Write the CSV from a JSON file of result rows
//! - `query` - Print the SQL and bindings an export would run
//! - `validate` - Check a job and its date range

mod commands;
mod runner;

pub use commands::{Cli, Commands, CreatedArg, JobArgs, OutputFormat};
pub use runner::Runner;
