//! Named placeholder handling
//!
//! DuckDB binds positionally, so `:name` placeholders are rewritten to `?`
//! and the bound values are ordered to match.

use crate::error::{Error, Result};
use crate::types::{Binding, JsonValue};
use duckdb::types::Value;

/// SQL with named placeholders rewritten to positional ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalSql {
    /// Rewritten SQL
    pub sql: String,
    /// Placeholder names in positional order (repeats allowed)
    pub names: Vec<String>,
}

impl PositionalSql {
    /// Order binding values by placeholder position
    ///
    /// A placeholder with no matching binding is an error; extra bindings
    /// are ignored.
    pub fn values(&self, bindings: &[Binding]) -> Result<Vec<Value>> {
        self.names
            .iter()
            .map(|name| {
                bindings
                    .iter()
                    .find(|b| &b.name == name)
                    .map(|b| json_to_duckdb(&b.value))
                    .ok_or_else(|| Error::query(format!("No value bound for placeholder :{name}")))
            })
            .collect()
    }
}

/// Rewrite `:name` placeholders to `?`
///
/// Text inside single-quoted literals and double-quoted identifiers is
/// copied as-is, as are `::` casts.
pub fn rewrite_placeholders(sql: &str) -> PositionalSql {
    let mut out = String::with_capacity(sql.len());
    let mut names = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                out.push(c);
            }
            ':' if chars.peek() == Some(&':') => {
                out.push_str("::");
                chars.next();
            }
            ':' if chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') =>
            {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                names.push(name);
                out.push('?');
            }
            _ => out.push(c),
        }
    }

    PositionalSql { sql: out, names }
}

/// Convert a JSON binding value to a DuckDB parameter
pub fn json_to_duckdb(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::BigInt(i)
            } else if let Some(u) = n.as_u64() {
                Value::UBigInt(u)
            } else {
                n.as_f64().map_or(Value::Null, Value::Double)
            }
        }
        JsonValue::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}
