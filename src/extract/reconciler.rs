//! Row extraction and column reconciliation

use super::types::{CreatedField, ExportRow, Extraction, Issue};
use crate::dates::{format_display, utc_offset, DateParser};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, DEFAULT_DATE_COLUMN};
use chrono::FixedOffset;
use std::collections::BTreeSet;

/// Pulls the JSON payload out of each result row and aligns their fields
///
/// One extractor handles one result set; `extract` consumes it so the
/// canonical column set and the issue list never outlive a run.
#[derive(Debug, Clone)]
pub struct RowExtractor {
    /// Column holding the JSON payload
    data_field: String,
    /// Column holding the row timestamp
    date_column: String,
    /// `created` injection policy
    created: CreatedField,
    /// Offset used when formatting `created`
    display_offset: FixedOffset,
    /// Parser for the row timestamp
    parser: DateParser,
    /// Union of all payload keys seen so far
    columns: BTreeSet<String>,
    /// Rows accepted so far
    accepted: usize,
    /// Set once two accepted rows disagree on their keys
    diverged: bool,
    /// Skipped rows
    issues: Vec<Issue>,
}

impl RowExtractor {
    /// Create an extractor reading payloads from `data_field`
    pub fn new(data_field: impl Into<String>) -> Self {
        Self {
            data_field: data_field.into(),
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            created: CreatedField::Omit,
            display_offset: utc_offset(),
            parser: DateParser::new(),
            columns: BTreeSet::new(),
            accepted: 0,
            diverged: false,
            issues: Vec::new(),
        }
    }

    /// Set the `created` injection policy
    #[must_use]
    pub fn with_created_field(mut self, created: CreatedField) -> Self {
        self.created = created;
        self
    }

    /// Set the offset `created` is displayed in
    #[must_use]
    pub fn with_display_offset(mut self, offset: FixedOffset) -> Self {
        self.display_offset = offset;
        self
    }

    /// Set the column the row timestamp is read from
    #[must_use]
    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = column.into();
        self
    }

    /// Set the parser used for the row timestamp
    #[must_use]
    pub fn with_parser(mut self, parser: DateParser) -> Self {
        self.parser = parser;
        self
    }

    /// Extract from a raw result value, checking its shape first
    ///
    /// The value must be a non-empty JSON array of row objects.
    pub fn extract(self, result: &JsonValue) -> Result<Extraction> {
        match result {
            JsonValue::Null => Err(no_results()),
            JsonValue::Array(rows) => self.extract_rows(rows),
            JsonValue::Object(map) if map.is_empty() => Err(no_results()),
            _ => Err(Error::invalid_input(
                "Input is not a list of result rows; the 0'th index does not exist",
            )),
        }
    }

    /// Extract from a list of result rows
    pub fn extract_rows(mut self, rows: &[JsonValue]) -> Result<Extraction> {
        if rows.is_empty() {
            return Err(no_results());
        }

        let mut extracted = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(data) = self.extract_row(row) {
                extracted.push(data);
            }
        }

        if extracted.is_empty() {
            return Err(Error::invalid_input(
                "No valid rows found during transformation",
            ));
        }

        if self.diverged {
            tracing::debug!(
                columns = self.columns.len(),
                "Rows have differing fields, back-filling missing columns"
            );
            reconcile(&self.columns, &mut extracted);
        }

        Ok(Extraction {
            header: self.columns.into_iter().collect(),
            rows: extracted,
            issues: self.issues,
            diverged: self.diverged,
        })
    }

    /// Pass 1 for a single row; `None` means it was recorded as an issue
    fn extract_row(&mut self, row: &JsonValue) -> Option<ExportRow> {
        let Some(object) = row.as_object() else {
            self.record_issue("Row is not a mapping of column names to values", row);
            return None;
        };

        let Some(payload) = object.get(&self.data_field) else {
            let message = format!(
                "Expected data field of name: '{}', not found for this row",
                self.data_field
            );
            self.record_issue(message, row);
            return None;
        };

        let mut data = match decode_payload(payload) {
            Ok(data) => data,
            Err(reason) => {
                let message = format!(
                    "Data field '{}' does not hold a JSON object: {reason}",
                    self.data_field
                );
                self.record_issue(message, row);
                return None;
            }
        };

        self.inject_created(object, &mut data);
        self.track_columns(&data);
        Some(data)
    }

    fn inject_created(&self, object: &JsonObject, data: &mut ExportRow) {
        let value = match self.created {
            CreatedField::Omit => return,
            CreatedField::Copy => object.get(&self.date_column).cloned(),
            CreatedField::Format => object.get(&self.date_column).map(|v| self.format_created(v)),
        };
        data.insert(
            DEFAULT_DATE_COLUMN.to_string(),
            value.unwrap_or(JsonValue::Null),
        );
    }

    fn format_created(&self, value: &JsonValue) -> JsonValue {
        value
            .as_str()
            .and_then(|s| self.parser.parse(s))
            .map_or_else(
                || value.clone(),
                |dt| JsonValue::String(format_display(&dt, self.display_offset)),
            )
    }

    fn track_columns(&mut self, data: &ExportRow) {
        let same_keys =
            data.len() == self.columns.len() && data.keys().all(|k| self.columns.contains(k));
        self.columns.extend(data.keys().cloned());
        if self.accepted > 0 && !same_keys {
            self.diverged = true;
        }
        self.accepted += 1;
    }

    fn record_issue(&mut self, message: impl Into<String>, row: &JsonValue) {
        let issue = Issue::new(message, row.clone());
        tracing::warn!(message = %issue.message, "Skipping row");
        self.issues.push(issue);
    }
}

/// Ensure every row carries every column, adding missing ones as null
///
/// Rows that already match are left untouched; running this twice is the
/// same as running it once.
pub fn reconcile(columns: &BTreeSet<String>, rows: &mut [ExportRow]) {
    for row in rows.iter_mut() {
        if row.len() == columns.len() && row.keys().eq(columns.iter()) {
            continue;
        }
        for column in columns {
            row.entry(column.clone()).or_insert(JsonValue::Null);
        }
    }
}

fn decode_payload(payload: &JsonValue) -> std::result::Result<ExportRow, String> {
    let object = match payload {
        JsonValue::String(text) => match serde_json::from_str::<JsonValue>(text) {
            Ok(JsonValue::Object(map)) => map,
            Ok(other) => return Err(format!("decoded to {}", json_type(&other))),
            Err(e) => return Err(e.to_string()),
        },
        JsonValue::Object(map) => map.clone(),
        other => return Err(format!("found {}", json_type(other))),
    };
    Ok(object.into_iter().collect())
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

fn no_results() -> Error {
    Error::invalid_input("No results were returned for the given criteria.")
}
