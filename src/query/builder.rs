//! SELECT statement construction from criteria

use crate::dates::{end_of_day, format_iso, start_of_day, DateParser};
use crate::error::{Error, Result};
use crate::types::{
    Binding, Criteria, CriteriaValue, JsonObject, JsonValue, DEFAULT_DATE_COLUMN, END_DATE_KEY,
    START_DATE_KEY,
};
use std::collections::HashSet;

/// A parameterized SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    /// SQL text with `:name` placeholders
    pub sql: String,
    /// Bound values, in placeholder order
    pub bindings: Vec<Binding>,
}

impl SelectQuery {
    /// Look up a bound value by placeholder name
    pub fn binding(&self, name: &str) -> Option<&JsonValue> {
        self.bindings
            .iter()
            .find(|b| b.name == name)
            .map(|b| &b.value)
    }

    /// Bindings as a JSON object (for logging)
    pub fn bindings_json(&self) -> JsonValue {
        JsonValue::Object(
            self.bindings
                .iter()
                .map(|b| (b.name.clone(), b.value.clone()))
                .collect::<JsonObject>(),
        )
    }
}

/// Builds `SELECT * FROM "<table>" WHERE ...` statements
///
/// Table and column names are trusted; they are double-quoted but not
/// otherwise sanitized.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    date_column: String,
    parser: DateParser,
}

impl QueryBuilder {
    /// Create a builder for a table
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            parser: DateParser::new(),
        }
    }

    /// Column the `startDate`/`endDate` range applies to
    #[must_use]
    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = column.into();
        self
    }

    /// Parser used for the date range values
    #[must_use]
    pub fn with_parser(mut self, parser: DateParser) -> Self {
        self.parser = parser;
        self
    }

    /// Build the statement
    pub fn build(&self, criteria: &Criteria) -> Result<SelectQuery> {
        let mut sql = format!("SELECT * FROM {}", quote_identifier(&self.table));
        let mut bindings = Vec::new();
        let mut segments = Vec::with_capacity(criteria.len());
        let mut placeholders = Placeholders::default();

        for (column, value) in criteria.iter() {
            match (column, value) {
                // A null bound means the bound is absent
                (START_DATE_KEY | END_DATE_KEY, CriteriaValue::Scalar(JsonValue::Null)) => {}
                (START_DATE_KEY, _) => {
                    let bound = start_of_day(&self.parse_date(column, value)?);
                    let name = placeholders.claim(START_DATE_KEY);
                    segments.push(format!(
                        "{} >= :{name}",
                        quote_identifier(&self.date_column)
                    ));
                    bindings.push(Binding::new(name, format_iso(&bound)));
                }
                (END_DATE_KEY, _) => {
                    let bound = end_of_day(&self.parse_date(column, value)?);
                    let name = placeholders.claim(END_DATE_KEY);
                    segments.push(format!(
                        "{} <= :{name}",
                        quote_identifier(&self.date_column)
                    ));
                    bindings.push(Binding::new(name, format_iso(&bound)));
                }
                (_, CriteriaValue::Scalar(v)) => {
                    let name = placeholders.claim(&placeholder_base(column));
                    segments.push(format!("{} = :{name}", quote_identifier(column)));
                    bindings.push(Binding::new(name, v.clone()));
                }
                (_, CriteriaValue::List(items)) if items.is_empty() => {
                    segments.push("1 = 0".to_string());
                }
                (_, CriteriaValue::List(items)) => {
                    let base = placeholder_base(column);
                    let mut names = Vec::with_capacity(items.len());
                    for (idx, item) in items.iter().enumerate() {
                        let name = placeholders.claim(&format!("{base}_{idx}"));
                        names.push(format!(":{name}"));
                        bindings.push(Binding::new(name, item.clone()));
                    }
                    segments.push(format!(
                        "{} IN ({})",
                        quote_identifier(column),
                        names.join(", ")
                    ));
                }
            }
        }

        if !segments.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&segments.join(" AND "));
        }

        Ok(SelectQuery { sql, bindings })
    }

    fn parse_date(
        &self,
        key: &str,
        value: &CriteriaValue,
    ) -> Result<chrono::DateTime<chrono::FixedOffset>> {
        let raw = match value {
            CriteriaValue::Scalar(JsonValue::String(s)) => s.as_str(),
            CriteriaValue::Scalar(other) => return Err(Error::invalid_date(key, other.to_string())),
            CriteriaValue::List(items) => {
                return Err(Error::invalid_date(
                    key,
                    JsonValue::Array(items.clone()).to_string(),
                ))
            }
        };
        self.parser
            .parse(raw)
            .ok_or_else(|| Error::invalid_date(key, raw))
    }
}

/// Wrap an identifier in double quotes, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Placeholder-safe form of a column name
fn placeholder_base(column: &str) -> String {
    column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Placeholder names handed out during one build call
#[derive(Default)]
struct Placeholders {
    used: HashSet<String>,
}

impl Placeholders {
    fn claim(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{base}_{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
