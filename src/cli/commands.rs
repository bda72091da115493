//! CLI commands and argument parsing

use crate::config::ExportJob;
use crate::error::{Error, Result};
use crate::extract::CreatedField;
use crate::types::{Criteria, END_DATE_KEY, START_DATE_KEY};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Solidafy Export CLI
#[derive(Parser, Debug)]
#[command(name = "solidafy-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Export job file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub job: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a table's payload column to CSV
    Export(JobArgs),

    /// Export rows from a JSON file instead of a database
    Convert {
        /// JSON file holding an array of result rows
        #[arg(short, long)]
        input: PathBuf,

        /// Job settings
        #[command(flatten)]
        job: JobArgs,
    },

    /// Print the SQL and bindings an export would run
    Query(JobArgs),

    /// Validate a job and its date range
    Validate(JobArgs),
}

/// Job settings; each flag overrides the job file
#[derive(Args, Debug, Default, Clone)]
pub struct JobArgs {
    /// Database connection string
    #[arg(long)]
    pub dsn: Option<String>,

    /// Table to select from
    #[arg(short, long)]
    pub table: Option<String>,

    /// Column holding the JSON payload
    #[arg(short, long)]
    pub data_field: Option<String>,

    /// Export path (file:///path/out.csv or s3://bucket/key.csv)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Criteria as a JSON object, merged over the job's criteria
    #[arg(long)]
    pub criteria: Option<String>,

    /// Range start (inclusive, from 00:00:00)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Range end (inclusive, through 23:59:59)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Keep the output file name as given
    #[arg(long)]
    pub no_randomize: bool,

    /// Skip date range validation
    #[arg(long)]
    pub no_validate_dates: bool,

    /// How to carry the row timestamp into the CSV
    #[arg(long)]
    pub created: Option<CreatedArg>,

    /// Column the date range applies to
    #[arg(long)]
    pub date_column: Option<String>,

    /// Offset for dates without one (e.g. -07:00)
    #[arg(long)]
    pub default_offset: Option<String>,

    /// CSV field delimiter
    #[arg(long)]
    pub delimiter: Option<char>,

    /// End CSV records with CRLF
    #[arg(long)]
    pub crlf: bool,
}

impl JobArgs {
    /// Apply these flags on top of a job
    pub fn apply(&self, job: &mut ExportJob) -> Result<()> {
        if let Some(dsn) = &self.dsn {
            job.dsn = Some(dsn.clone());
        }
        if let Some(table) = &self.table {
            job.table.clone_from(table);
        }
        if let Some(data_field) = &self.data_field {
            job.data_field.clone_from(data_field);
        }
        if let Some(output) = &self.output {
            job.output.clone_from(output);
        }
        if let Some(raw) = &self.criteria {
            let value: serde_json::Value = serde_json::from_str(raw)
                .map_err(|e| Error::config(format!("Invalid --criteria JSON: {e}")))?;
            for (column, value) in Criteria::from_json(&value)?.iter() {
                job.criteria.insert(column, value.clone());
            }
        }
        if let Some(start) = &self.start_date {
            job.criteria.insert(START_DATE_KEY, start.as_str());
        }
        if let Some(end) = &self.end_date {
            job.criteria.insert(END_DATE_KEY, end.as_str());
        }
        if self.no_randomize {
            job.randomize = false;
        }
        if self.no_validate_dates {
            job.validate_dates = false;
        }
        if let Some(created) = self.created {
            job.created_field = created.into();
        }
        if let Some(column) = &self.date_column {
            job.date_column.clone_from(column);
        }
        if let Some(offset) = &self.default_offset {
            job.default_offset = Some(offset.clone());
        }
        if let Some(delimiter) = self.delimiter {
            job.csv.delimiter = delimiter;
        }
        if self.crlf {
            job.csv.crlf = true;
        }
        Ok(())
    }
}

/// `created` column policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CreatedArg {
    /// Leave it out
    Omit,
    /// Copy the raw value
    Copy,
    /// Reformat as `YYYY-MM-DD hh:mm:ss am`
    Format,
}

impl From<CreatedArg> for CreatedField {
    fn from(arg: CreatedArg) -> Self {
        match arg {
            CreatedArg::Omit => CreatedField::Omit,
            CreatedArg::Copy => CreatedField::Copy,
            CreatedArg::Format => CreatedField::Format,
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
