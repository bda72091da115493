//! Connection seam between the exporter and a database driver

use crate::error::Result;
use crate::types::{Binding, JsonValue};

/// An open database connection
pub trait Connection {
    /// Prepare a statement using `:name` placeholders
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement + '_>>;

    /// Human-readable description of the connection with secrets masked
    fn connection_info(&self) -> String {
        String::from("<connection>")
    }
}

/// A prepared statement
pub trait Statement {
    /// Execute with named bindings, returning one JSON object per row
    fn execute(&mut self, bindings: &[Binding]) -> Result<Vec<JsonValue>>;
}
