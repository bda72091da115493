//! Common types used throughout Solidafy Export
//!
//! This module contains shared type definitions, type aliases,
//! and the select criteria model.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Reserved Criteria Keys
// ============================================================================

/// Criteria key holding the first day of the date range
pub const START_DATE_KEY: &str = "startDate";

/// Criteria key holding the last day (inclusive) of the date range
pub const END_DATE_KEY: &str = "endDate";

/// Default column the date range applies to
pub const DEFAULT_DATE_COLUMN: &str = "created";

/// Check if a criteria key is one of the reserved date range keys
pub fn is_date_key(key: &str) -> bool {
    key == START_DATE_KEY || key == END_DATE_KEY
}

// ============================================================================
// Criteria
// ============================================================================

/// Value side of a criteria entry
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaValue {
    /// Equality test
    Scalar(JsonValue),
    /// Membership test
    List(Vec<JsonValue>),
}

impl CriteriaValue {
    /// Scalar value as a string, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CriteriaValue::Scalar(JsonValue::String(s)) => Some(s),
            _ => None,
        }
    }

    fn from_json(column: &str, value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Array(items) => {
                if let Some(bad) = items.iter().find(|v| v.is_array() || v.is_object()) {
                    return Err(Error::invalid_criteria(
                        column,
                        format!("list elements must be scalars, got {bad}"),
                    ));
                }
                Ok(CriteriaValue::List(items))
            }
            JsonValue::Object(_) => Err(Error::invalid_criteria(
                column,
                "value must be a scalar or a list of scalars",
            )),
            scalar => Ok(CriteriaValue::Scalar(scalar)),
        }
    }

    fn to_json(&self) -> JsonValue {
        match self {
            CriteriaValue::Scalar(v) => v.clone(),
            CriteriaValue::List(items) => JsonValue::Array(items.clone()),
        }
    }
}

impl From<&str> for CriteriaValue {
    fn from(value: &str) -> Self {
        CriteriaValue::Scalar(JsonValue::String(value.to_string()))
    }
}

impl From<String> for CriteriaValue {
    fn from(value: String) -> Self {
        CriteriaValue::Scalar(JsonValue::String(value))
    }
}

impl From<i64> for CriteriaValue {
    fn from(value: i64) -> Self {
        CriteriaValue::Scalar(JsonValue::from(value))
    }
}

impl From<bool> for CriteriaValue {
    fn from(value: bool) -> Self {
        CriteriaValue::Scalar(JsonValue::Bool(value))
    }
}

impl From<Vec<JsonValue>> for CriteriaValue {
    fn from(items: Vec<JsonValue>) -> Self {
        CriteriaValue::List(items)
    }
}

/// Caller-supplied filter applied as a SQL WHERE clause
///
/// Entries keep insertion order, which is the order the WHERE clause is
/// rendered in. Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonObject", into = "JsonObject")]
pub struct Criteria {
    entries: Vec<(String, CriteriaValue)>,
}

impl Criteria {
    /// Create empty criteria
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry (builder style)
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CriteriaValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CriteriaValue>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Remove an entry
    pub fn remove(&mut self, column: &str) -> Option<CriteriaValue> {
        let idx = self.entries.iter().position(|(k, _)| k == column)?;
        Some(self.entries.remove(idx).1)
    }

    /// Get the value for a column
    pub fn get(&self, column: &str) -> Option<&CriteriaValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v)
    }

    /// Get a scalar string value for a column
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(CriteriaValue::as_str)
    }

    /// Check if a column has an entry
    pub fn contains_key(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CriteriaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse criteria from a JSON object
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Self::try_from(map.clone()),
            JsonValue::Null => Ok(Self::new()),
            other => Err(Error::config(format!(
                "Select criteria must be a JSON object, got {other}"
            ))),
        }
    }
}

impl TryFrom<JsonObject> for Criteria {
    type Error = Error;

    fn try_from(map: JsonObject) -> Result<Self> {
        let mut criteria = Criteria::new();
        for (column, value) in map {
            let value = CriteriaValue::from_json(&column, value)?;
            criteria.entries.push((column, value));
        }
        Ok(criteria)
    }
}

impl From<Criteria> for JsonObject {
    fn from(criteria: Criteria) -> Self {
        criteria
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

// ============================================================================
// Bindings
// ============================================================================

/// A named query parameter and its bound value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Placeholder name without the leading colon
    pub name: String,
    /// Bound value
    pub value: JsonValue,
}

impl Binding {
    /// Create a binding
    pub fn new(name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
