//! Engine types
//!
//! Configuration and results for an export run.

use crate::dates::{utc_offset, DateParser};
use crate::extract::{CreatedField, Issue};
use crate::types::{Criteria, DEFAULT_DATE_COLUMN};
use chrono::FixedOffset;
use serde::Serialize;

/// Default name of the JSON payload column
pub const DEFAULT_DATA_FIELD: &str = "data";

/// Configuration for an export run
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Table to select from
    pub table: String,
    /// Column holding each row's JSON payload
    pub data_field: String,
    /// Column filters
    pub criteria: Criteria,
    /// Whether to validate the `startDate`/`endDate` pair before querying
    pub validate_dates: bool,
    /// How the row timestamp is carried into the output
    pub created_field: CreatedField,
    /// Column the date range and `created` refer to
    pub date_column: String,
    /// Offset for date criteria without one
    pub default_offset: FixedOffset,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            table: String::new(),
            data_field: DEFAULT_DATA_FIELD.to_string(),
            criteria: Criteria::new(),
            validate_dates: true,
            created_field: CreatedField::Omit,
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            default_offset: utc_offset(),
        }
    }
}

impl ExportConfig {
    /// Create a config for a table and payload column
    pub fn new(table: impl Into<String>, data_field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            data_field: data_field.into(),
            ..Self::default()
        }
    }

    /// Set the criteria
    #[must_use]
    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Enable or disable date range validation
    #[must_use]
    pub fn with_date_validation(mut self, enabled: bool) -> Self {
        self.validate_dates = enabled;
        self
    }

    /// Set the `created` policy
    #[must_use]
    pub fn with_created_field(mut self, created: CreatedField) -> Self {
        self.created_field = created;
        self
    }

    /// Set the date column
    #[must_use]
    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = column.into();
        self
    }

    /// Set the offset assumed for dates without one
    #[must_use]
    pub fn with_default_offset(mut self, offset: FixedOffset) -> Self {
        self.default_offset = offset;
        self
    }

    /// Date parser honoring the default offset
    pub fn parser(&self) -> DateParser {
        DateParser::new().with_default_offset(self.default_offset)
    }
}

/// Result of a successful export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportOutcome {
    /// Where the CSV was written
    pub path: String,
    /// CSV header
    pub header: Vec<String>,
    /// Rows returned by the query
    pub rows_fetched: usize,
    /// Rows written to the CSV
    pub rows_written: usize,
    /// Whether rows had differing field sets
    pub diverged: bool,
    /// Rows skipped during extraction
    pub issues: Vec<Issue>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExportOutcome {
    /// Check if any rows were skipped
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}
