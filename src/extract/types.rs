//! Extractor types

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One output row: field name to value, sorted by name
pub type ExportRow = BTreeMap<String, JsonValue>;

/// How the row's own timestamp column is carried into the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatedField {
    /// Not added
    #[default]
    Omit,
    /// Copied as returned by the database
    Copy,
    /// Re-formatted as `YYYY-MM-DD hh:mm:ss am/pm` in the display offset
    Format,
}

/// A row that was skipped during extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// What was wrong
    pub message: String,
    /// The offending row as returned by the query
    pub row: JsonValue,
}

impl Issue {
    /// Create an issue
    pub fn new(message: impl Into<String>, row: JsonValue) -> Self {
        Self {
            message: message.into(),
            row,
        }
    }
}

/// Result of extracting and reconciling one result set
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Canonical column set, sorted; the CSV header
    pub header: Vec<String>,
    /// Rows, each holding exactly the header's keys
    pub rows: Vec<ExportRow>,
    /// Rows that were skipped
    pub issues: Vec<Issue>,
    /// Whether rows disagreed on their field sets
    pub diverged: bool,
}
