//! End-to-end export tests
//!
//! Tests the full flow: job → DuckDB source → criteria query → CSV on disk or S3

use clap::Parser;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use pretty_assertions::assert_eq;
use serde_json::json;
use solidafy_export::cli::{Cli, Runner};
use solidafy_export::config::{load_job_from_str, JobFormat};
use solidafy_export::database::{Connection, DuckDbConnection, Statement};
use solidafy_export::engine::{ExportConfig, Exporter};
use solidafy_export::extract::CreatedField;
use solidafy_export::output::{build_sink, build_sink_with_config, FileSystemSink, S3Sink};
use solidafy_export::{Criteria, Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

/// Write a DuckDB file with a `leadgen` table and return its DSN
fn seed_database(dir: &TempDir) -> String {
    let path = dir.path().join("leads.duckdb");
    let conn = duckdb::Connection::open(&path).unwrap();
    conn.execute_batch(
        r#"CREATE TABLE leadgen (id INTEGER, source VARCHAR, campaign INTEGER, created VARCHAR, data VARCHAR);
           INSERT INTO leadgen VALUES
             (1, 'web', 10, '2015-04-01T09:30:00+00:00', '{"name": "Alice", "email": "alice@example.com"}'),
             (2, 'api', 10, '2015-04-10T14:00:00+00:00', '{"name": "Bob", "phone": "555-0100"}'),
             (3, 'web', 20, '2015-04-30T23:15:00+00:00', '{"name": "Carol, Jr.", "email": "carol@example.com"}'),
             (4, 'web', 10, '2015-05-01T00:00:00+00:00', '{"name": "Dave"}'),
             (5, 'web', 30, '2015-04-15T12:00:00+00:00', '{"name": "Eve", "notes": "said \"hi\""}');"#,
    )
    .unwrap();
    format!("duckdb:{}", path.display())
}

fn output_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

// ============================================================================
// Database Export Tests
// ============================================================================

#[tokio::test]
async fn test_export_duckdb_file_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let dsn = seed_database(&dir);
    let path = output_path(&dir, "leadgen.csv");

    let criteria = Criteria::new()
        .with("source", "web")
        .with("startDate", "2015-04-01")
        .with("endDate", "2015-04-30");

    let mut exporter = Exporter::new(ExportConfig::new("leadgen", "data").with_criteria(criteria))
        .with_dsn(dsn)
        .with_sink(Box::new(
            FileSystemSink::new(path.to_string_lossy()).with_randomize(false),
        ));

    let outcome = exporter.run().await.unwrap();

    assert_eq!(outcome.path, path.to_string_lossy());
    assert_eq!(outcome.rows_fetched, 3);
    assert_eq!(outcome.rows_written, 3);
    assert_eq!(outcome.header, vec!["email", "name", "notes"]);
    assert!(outcome.diverged);
    assert!(!outcome.has_issues());

    assert_eq!(
        read(&path),
        "email,name,notes\n\
         alice@example.com,Alice,\n\
         carol@example.com,\"Carol, Jr.\",\n\
         ,Eve,\"said \"\"hi\"\"\"\n"
    );
}

#[tokio::test]
async fn test_export_list_criteria_with_created_copy() {
    let dir = tempfile::tempdir().unwrap();
    let dsn = seed_database(&dir);
    let path = output_path(&dir, "campaigns.csv");

    let criteria = Criteria::new().with("campaign", vec![json!(20), json!(30)]);
    let config = ExportConfig::new("leadgen", "data")
        .with_criteria(criteria)
        .with_created_field(CreatedField::Copy);

    let mut exporter = Exporter::new(config)
        .with_connection(Box::new(DuckDbConnection::open(&dsn).unwrap()))
        .with_sink(Box::new(
            FileSystemSink::new(path.to_string_lossy()).with_randomize(false),
        ));

    let outcome = exporter.run().await.unwrap();

    assert_eq!(outcome.rows_written, 2);
    assert_eq!(outcome.header[0], "created");

    let csv = read(&path);
    assert!(csv.contains("2015-04-30T23:15:00+00:00"));
    assert!(csv.contains("2015-04-15T12:00:00+00:00"));
    assert!(!csv.contains("Alice"));
}

#[tokio::test]
async fn test_export_randomizes_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let dsn = seed_database(&dir);
    let uri = format!("file://{}", output_path(&dir, "leadgen.csv").display());

    let mut exporter = Exporter::new(ExportConfig::new("leadgen", "data"))
        .with_dsn(dsn)
        .with_sink(build_sink(&uri, true).unwrap());

    let outcome = exporter.run().await.unwrap();

    let plain = output_path(&dir, "leadgen.csv");
    assert_ne!(outcome.path, plain.to_string_lossy());
    assert!(!outcome.path.starts_with("file://"));
    assert!(outcome.path.starts_with(&*dir.path().join("leadgen-").to_string_lossy()));
    assert!(outcome.path.ends_with(".csv"));

    assert!(read(Path::new(&outcome.path)).starts_with("email,name,notes,phone\n"));
    assert!(!plain.exists());
}

#[tokio::test]
async fn test_export_to_object_store() {
    let dir = tempfile::tempdir().unwrap();
    let dsn = seed_database(&dir);
    let store = Arc::new(InMemory::new());

    let sink = S3Sink::with_store(store.clone(), "exports", "daily/leadgen99.csv")
        .with_randomize(false);
    let criteria = Criteria::new().with("id", 2_i64);
    let mut exporter = Exporter::new(ExportConfig::new("leadgen", "data").with_criteria(criteria))
        .with_dsn(dsn)
        .with_sink(Box::new(sink));

    let outcome = exporter.run().await.unwrap();
    assert_eq!(outcome.path, "s3://exports/daily/leadgen99.csv");

    let object = store
        .get(&ObjectPath::from("daily/leadgen99.csv"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(&object[..], b"name,phone\nBob,555-0100\n");
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_invalid_range_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let dsn = seed_database(&dir);
    let path = output_path(&dir, "leadgen.csv");

    let criteria = Criteria::new()
        .with("startDate", "2015-04-30")
        .with("endDate", "2015-04-01");
    let mut exporter = Exporter::new(ExportConfig::new("leadgen", "data").with_criteria(criteria))
        .with_dsn(dsn)
        .with_sink(Box::new(
            FileSystemSink::new(path.to_string_lossy()).with_randomize(false),
        ));

    let err = exporter.run().await.unwrap_err();
    assert!(err.is_validation());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_unknown_column_reports_generic_query_error() {
    let dir = tempfile::tempdir().unwrap();
    let dsn = seed_database(&dir);
    let path = output_path(&dir, "leadgen.csv");

    let criteria = Criteria::new().with("no_such_column", "x");
    let mut exporter = Exporter::new(ExportConfig::new("leadgen", "data").with_criteria(criteria))
        .with_dsn(dsn)
        .with_sink(Box::new(
            FileSystemSink::new(path.to_string_lossy()).with_randomize(false),
        ));

    let err = exporter.run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Query);
    assert!(!err.to_string().contains("no_such_column"));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_source_is_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let dsn = seed_database(&dir);

    let conn = DuckDbConnection::open(&dsn).unwrap();
    let err = conn
        .prepare("DELETE FROM leadgen")
        .and_then(|mut stmt| stmt.execute(&[]))
        .unwrap_err();
    assert!(matches!(err, Error::Query { .. }));
}

// ============================================================================
// Job and CLI Tests
// ============================================================================

#[tokio::test]
async fn test_export_from_yaml_job() {
    let dir = tempfile::tempdir().unwrap();
    let dsn = seed_database(&dir);
    let path = output_path(&dir, "job.csv");

    let yaml = format!(
        r#"
table: leadgen
data_field: data
output: "file://{}"
dsn: "{}"
randomize: false
criteria:
  source: api
csv:
  delimiter: ";"
"#,
        path.display(),
        dsn
    );

    let job = load_job_from_str(&yaml, JobFormat::Yaml).unwrap();
    job.validate().unwrap();

    let sink =
        build_sink_with_config(&job.output, job.randomize, job.csv_config().unwrap()).unwrap();
    let mut exporter = Exporter::new(job.export_config().unwrap())
        .with_dsn(job.dsn.clone().unwrap())
        .with_sink(sink);
    exporter.run().await.unwrap();

    assert_eq!(read(&path), "name;phone\nBob;555-0100\n");
}

#[tokio::test]
async fn test_cli_export_command() {
    let dir = tempfile::tempdir().unwrap();
    let dsn = seed_database(&dir);
    let path = output_path(&dir, "cli.csv");
    let uri = format!("file://{}", path.display());

    let cli = Cli::try_parse_from([
        "solidafy-export",
        "export",
        "--dsn",
        &dsn,
        "-t",
        "leadgen",
        "-o",
        &uri,
        "--criteria",
        r#"{"campaign": 10}"#,
        "--start-date",
        "2015-04-01",
        "--end-date",
        "2015-04-30",
        "--no-randomize",
        "--delimiter",
        ";",
    ])
    .unwrap();

    Runner::new(cli).run().await.unwrap();

    assert_eq!(
        read(&path),
        "email;name;phone\nalice@example.com;Alice;\n;Bob;555-0100\n"
    );
}
