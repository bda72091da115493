//! Tests for extract module

use super::*;
use crate::error::{Error, ErrorKind};
use chrono::FixedOffset;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn row(id: i64, data: &Value) -> Value {
    json!({"id": id, "created": "2015-04-01T15:04:05Z", "data": data.to_string()})
}

fn header(extraction: &Extraction) -> Vec<&str> {
    extraction.header.iter().map(String::as_str).collect()
}

// ============================================================================
// Happy Path
// ============================================================================

#[test]
fn test_identical_key_sets() {
    let rows = json!([
        row(1, &json!({"name": "Alice", "email": "a@example.com"})),
        row(2, &json!({"email": "b@example.com", "name": "Bob"})),
    ]);

    let extraction = RowExtractor::new("data").extract(&rows).unwrap();

    assert_eq!(header(&extraction), vec!["email", "name"]);
    assert_eq!(extraction.rows.len(), 2);
    assert!(!extraction.diverged);
    assert!(extraction.issues.is_empty());
    for r in &extraction.rows {
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["email", "name"]);
    }
}

#[test]
fn test_divergent_rows_are_back_filled() {
    let rows = json!([
        row(1, &json!({"a": 1, "b": 2})),
        row(2, &json!({"a": 3, "c": 4})),
    ]);

    let extraction = RowExtractor::new("data").extract(&rows).unwrap();

    assert_eq!(header(&extraction), vec!["a", "b", "c"]);
    assert!(extraction.diverged);
    assert_eq!(extraction.rows[0].get("c"), Some(&Value::Null));
    assert_eq!(extraction.rows[1].get("b"), Some(&Value::Null));
    assert_eq!(extraction.rows[0].get("b"), Some(&json!(2)));
    assert_eq!(extraction.rows[1].get("c"), Some(&json!(4)));
}

#[test]
fn test_later_row_with_fewer_fields_is_back_filled() {
    let rows = json!([
        row(1, &json!({"a": 1, "b": 2})),
        row(2, &json!({"a": 3})),
    ]);

    let extraction = RowExtractor::new("data").extract(&rows).unwrap();

    assert!(extraction.diverged);
    assert_eq!(extraction.rows[1].get("b"), Some(&Value::Null));
    for r in &extraction.rows {
        assert_eq!(r.len(), 2);
    }
}

#[test]
fn test_payload_may_already_be_an_object() {
    let rows = json!([{"id": 1, "data": {"z": true, "y": null}}]);
    let extraction = RowExtractor::new("data").extract(&rows).unwrap();
    assert_eq!(header(&extraction), vec!["y", "z"]);
}

// ============================================================================
// Shape Errors
// ============================================================================

#[test]
fn test_empty_input_is_data_shape_error() {
    for input in [json!([]), json!(null), json!({})] {
        let err = RowExtractor::new("data").extract(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataShape);
        assert!(err.to_string().contains("No results were returned"));
    }
}

#[test]
fn test_non_list_input_is_data_shape_error() {
    let err = RowExtractor::new("data")
        .extract(&json!({"foo": "bar"}))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));
    assert!(err.to_string().contains("not a list"));

    let err = RowExtractor::new("data").extract(&json!("rows")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataShape);
}

#[test]
fn test_all_rows_unusable_is_data_shape_error() {
    let err = RowExtractor::new("data")
        .extract(&json!([{"foo": "bar"}]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataShape);
    assert!(err.to_string().contains("No valid rows"));
}

// ============================================================================
// Issues
// ============================================================================

#[test]
fn test_first_row_missing_data_field() {
    let rows = json!([
        {"id": 1, "created": "2015-04-01"},
        row(2, &json!({"a": 1})),
        row(3, &json!({"a": 2})),
    ]);

    let extraction = RowExtractor::new("data").extract(&rows).unwrap();

    assert_eq!(extraction.rows.len(), 2);
    assert_eq!(extraction.issues.len(), 1);
    assert_eq!(
        extraction.issues[0].message,
        "Expected data field of name: 'data', not found for this row"
    );
    assert_eq!(extraction.issues[0].row["id"], json!(1));
}

#[test]
fn test_second_row_missing_data_field() {
    let rows = json!([
        row(1, &json!({"a": 1})),
        {"id": 2},
        row(3, &json!({"a": 2})),
    ]);

    let extraction = RowExtractor::new("data").extract(&rows).unwrap();
    assert_eq!(extraction.rows.len(), 2);
    assert_eq!(extraction.issues.len(), 1);
    assert!(!extraction.diverged);
}

#[test]
fn test_undecodable_payloads_are_issues() {
    let rows = json!([
        {"id": 1, "data": "{not json"},
        {"id": 2, "data": "[1, 2]"},
        {"id": 3, "data": 42},
        "not a row",
        row(5, &json!({"a": 1})),
    ]);

    let extraction = RowExtractor::new("data").extract(&rows).unwrap();
    assert_eq!(extraction.rows.len(), 1);
    assert_eq!(extraction.issues.len(), 4);
    assert!(extraction.issues[1].message.contains("an array"));
    assert!(extraction.issues[2].message.contains("a number"));
}

// ============================================================================
// Created Field
// ============================================================================

#[test]
fn test_created_copy() {
    let rows = json!([row(1, &json!({"a": 1}))]);
    let extraction = RowExtractor::new("data")
        .with_created_field(CreatedField::Copy)
        .extract(&rows)
        .unwrap();

    assert_eq!(header(&extraction), vec!["a", "created"]);
    assert_eq!(
        extraction.rows[0].get("created"),
        Some(&json!("2015-04-01T15:04:05Z"))
    );
}

#[test]
fn test_created_format_uses_display_offset() {
    let rows = json!([row(1, &json!({"a": 1}))]);
    let extraction = RowExtractor::new("data")
        .with_created_field(CreatedField::Format)
        .with_display_offset(FixedOffset::west_opt(7 * 3600).unwrap())
        .extract(&rows)
        .unwrap();

    assert_eq!(
        extraction.rows[0].get("created"),
        Some(&json!("2015-04-01 08:04:05 am"))
    );
}

#[test]
fn test_created_format_keeps_unparseable_value() {
    let rows = json!([{"data": "{\"a\": 1}", "created": "sometime"}]);
    let extraction = RowExtractor::new("data")
        .with_created_field(CreatedField::Format)
        .extract(&rows)
        .unwrap();
    assert_eq!(extraction.rows[0].get("created"), Some(&json!("sometime")));
}

#[test]
fn test_created_from_custom_column_missing_is_null() {
    let rows = json!([{"data": "{\"a\": 1}"}]);
    let extraction = RowExtractor::new("data")
        .with_created_field(CreatedField::Copy)
        .with_date_column("submitted_at")
        .extract(&rows)
        .unwrap();
    assert_eq!(header(&extraction), vec!["a", "created"]);
    assert_eq!(extraction.rows[0].get("created"), Some(&Value::Null));
}

#[test]
fn test_created_read_from_custom_column() {
    let rows = json!([{"data": "{\"a\": 1}", "ts": "2015-04-01T15:04:05Z"}]);
    let extraction = RowExtractor::new("data")
        .with_created_field(CreatedField::Format)
        .with_date_column("ts")
        .extract(&rows)
        .unwrap();

    assert_eq!(header(&extraction), vec!["a", "created"]);
    assert_eq!(
        extraction.rows[0].get("created"),
        Some(&json!("2015-04-01 03:04:05 pm"))
    );
    assert!(!extraction.rows[0].contains_key("ts"));
}

#[test]
fn test_empty_first_payload_still_diverges() {
    let rows = json!([{"data": "{}"}, {"data": "{\"a\": 1}"}]);
    let extraction = RowExtractor::new("data").extract(&rows).unwrap();

    assert!(extraction.diverged);
    assert_eq!(header(&extraction), vec!["a"]);
    assert_eq!(extraction.rows[0].get("a"), Some(&Value::Null));
    for row in &extraction.rows {
        assert_eq!(row.keys().collect::<Vec<_>>(), extraction.header.iter().collect::<Vec<_>>());
    }
}

// ============================================================================
// Reconcile
// ============================================================================

#[test]
fn test_reconcile_is_idempotent() {
    let columns: BTreeSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let mut rows = vec![
        ExportRow::from([("a".to_string(), json!(1))]),
        ExportRow::from([("b".to_string(), json!(2)), ("c".to_string(), json!(3))]),
    ];

    reconcile(&columns, &mut rows);
    let once = rows.clone();
    reconcile(&columns, &mut rows);

    assert_eq!(rows, once);
    for r in &rows {
        assert_eq!(r.keys().cloned().collect::<BTreeSet<_>>(), columns);
    }
    assert_eq!(rows[0].get("b"), Some(&Value::Null));
    assert_eq!(rows[1].get("a"), Some(&Value::Null));
}
