//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, JobArgs, OutputFormat};
use crate::config::{read_job, ExportJob};
use crate::engine::{ExportOutcome, Exporter};
use crate::error::{Error, Result, ResultExt};
use crate::output::{build_sink_with_config, ExportSink};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Export(args) => self.export(args).await,
            Commands::Convert { input, job } => self.convert(input, job).await,
            Commands::Query(args) => self.query(args),
            Commands::Validate(args) => self.validate(args),
        }
    }

    /// Load the job file (if any) and apply flag overrides
    fn load_job(&self, args: &JobArgs) -> Result<ExportJob> {
        let mut job = match &self.cli.job {
            Some(path) => read_job(path)?,
            None => ExportJob::default(),
        };
        args.apply(&mut job)?;
        Ok(job)
    }

    fn build_sink(job: &ExportJob) -> Result<Box<dyn ExportSink>> {
        build_sink_with_config(&job.output, job.randomize, job.csv_config()?)
    }

    /// Export from the database
    async fn export(&self, args: &JobArgs) -> Result<()> {
        let job = self.load_job(args)?;
        job.validate()?;

        let dsn = job
            .dsn
            .clone()
            .ok_or_else(|| Error::missing_field("dsn"))?;

        let mut exporter = Exporter::new(job.export_config()?)
            .with_dsn(dsn)
            .with_sink(Self::build_sink(&job)?);

        let outcome = exporter.run().await?;
        self.output_outcome(&outcome);
        Ok(())
    }

    /// Export rows read from a JSON file
    async fn convert(&self, input: &Path, args: &JobArgs) -> Result<()> {
        let job = self.load_job(args)?;
        job.validate_output()?;

        let content = fs::read_to_string(input).map_err(|e| {
            Error::config(format!("Failed to read input '{}': {e}", input.display()))
        })?;
        let records: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse input '{}'", input.display()))?;

        let exporter = Exporter::new(job.export_config()?).with_sink(Self::build_sink(&job)?);

        let outcome = exporter.export_records(&records).await?;
        self.output_outcome(&outcome);
        Ok(())
    }

    /// Print the query without running it
    fn query(&self, args: &JobArgs) -> Result<()> {
        let job = self.load_job(args)?;
        job.validate()?;

        let query = Exporter::new(job.export_config()?).plan()?;

        self.output_message(&json!({
            "type": "QUERY",
            "query": {
                "sql": query.sql,
                "bindings": query.bindings_json(),
            }
        }));
        Ok(())
    }

    /// Validate the job and its date range
    fn validate(&self, args: &JobArgs) -> Result<()> {
        let job = self.load_job(args)?;
        job.validate()?;

        let range = Exporter::new(job.export_config()?).validate_range()?;
        let range = range.map(|r| {
            json!({
                "start": r.start_binding(),
                "end": r.end_binding(),
                "display_offset": r.display_offset.to_string(),
            })
        });

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!("Export job for table '{}' is valid", job.table),
            },
            "range": range,
        }));
        Ok(())
    }

    fn output_outcome(&self, outcome: &ExportOutcome) {
        self.output_message(&json!({
            "type": "EXPORT",
            "export": outcome,
        }));
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportJob;
    use crate::extract::CreatedField;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("solidafy-export").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_parse_export_flags() {
        let cli = parse(&[
            "export",
            "--dsn",
            ":memory:",
            "-t",
            "leadgen",
            "-o",
            "file:///tmp/out.csv",
            "--start-date",
            "2015-04-01",
            "--end-date",
            "2015-04-30",
            "--created",
            "format",
            "--no-randomize",
            "-f",
            "pretty",
        ]);
        assert_eq!(cli.format, OutputFormat::Pretty);

        let Commands::Export(args) = &cli.command else {
            panic!("expected export command");
        };
        let mut job = ExportJob::default();
        args.apply(&mut job).unwrap();

        assert_eq!(job.table, "leadgen");
        assert_eq!(job.dsn.as_deref(), Some(":memory:"));
        assert!(!job.randomize);
        assert_eq!(job.created_field, CreatedField::Format);
        assert_eq!(job.criteria.get_str("startDate"), Some("2015-04-01"));
        assert_eq!(job.criteria.get_str("endDate"), Some("2015-04-30"));
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_flags_override_job_criteria() {
        let mut job = ExportJob {
            criteria: crate::types::Criteria::new()
                .with("source", "web")
                .with("campaign", 7_i64),
            ..ExportJob::default()
        };
        let args = JobArgs {
            criteria: Some(r#"{"source": "api", "id": [1, 2]}"#.to_string()),
            ..JobArgs::default()
        };

        args.apply(&mut job).unwrap();

        assert_eq!(job.criteria.get_str("source"), Some("api"));
        let keys: Vec<&str> = job.criteria.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["source", "campaign", "id"]);
    }

    #[test]
    fn test_bad_criteria_flag() {
        let mut job = ExportJob::default();
        let args = JobArgs {
            criteria: Some("[1, 2]".to_string()),
            ..JobArgs::default()
        };
        assert!(args.apply(&mut job).is_err());

        let args = JobArgs {
            criteria: Some("{not json".to_string()),
            ..JobArgs::default()
        };
        assert!(args.apply(&mut job).is_err());
    }

    #[test]
    fn test_parse_convert() {
        let cli = parse(&["convert", "-i", "rows.json", "-o", "file:///tmp/out.csv"]);
        match &cli.command {
            Commands::Convert { input, job } => {
                assert_eq!(input, Path::new("rows.json"));
                assert_eq!(job.output.as_deref(), Some("file:///tmp/out.csv"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_convert_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rows.json");
        let output = dir.path().join("out.csv");
        fs::write(
            &input,
            json!([{"data": "{\"b\": 1, \"a\": 2}"}, {"data": "{\"a\": 3}"}]).to_string(),
        )
        .unwrap();

        let output_uri = format!("file://{}", output.display());
        let input_arg = input.to_string_lossy().to_string();
        let cli = parse(&[
            "convert",
            "-i",
            &input_arg,
            "-o",
            &output_uri,
            "--no-randomize",
        ]);

        Runner::new(cli).run().await.unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "a,b\n2,1\n3,\n");
    }

    #[tokio::test]
    async fn test_export_requires_dsn() {
        let cli = parse(&["export", "-t", "leadgen", "-o", "file:///tmp/out.csv"]);
        let err = Runner::new(cli).run().await.unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { field } if field == "dsn"));
    }

    #[test]
    fn test_query_and_validate_commands() {
        let cli = parse(&[
            "query",
            "-t",
            "leadgen",
            "-o",
            "s3://exports/out.csv",
            "--criteria",
            r#"{"source": "web"}"#,
        ]);
        let runner = Runner::new(cli);
        let Commands::Query(args) = &runner.cli.command else {
            panic!("expected query command");
        };
        assert!(runner.query(args).is_ok());

        let cli = parse(&[
            "validate",
            "-t",
            "leadgen",
            "-o",
            "file:///tmp/out.csv",
            "--start-date",
            "2015-04-30",
            "--end-date",
            "2015-04-01",
        ]);
        let runner = Runner::new(cli);
        let Commands::Validate(args) = &runner.cli.command else {
            panic!("expected validate command");
        };
        assert!(runner.validate(args).unwrap_err().is_validation());
    }
}
