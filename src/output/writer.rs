//! CSV encoder
//!
//! Serializes a header plus reconciled rows into CSV bytes.

use crate::error::{Error, Result};
use crate::extract::ExportRow;
use crate::types::JsonValue;
use bytes::Bytes;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::borrow::Cow;

/// Configuration for the CSV encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvWriterConfig {
    delimiter: u8,
    crlf: bool,
}

impl Default for CsvWriterConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            crlf: false,
        }
    }
}

impl CsvWriterConfig {
    /// Create a new config with default settings (comma, LF)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Terminate records with CRLF instead of LF
    #[must_use]
    pub fn with_crlf(mut self, enabled: bool) -> Self {
        self.crlf = enabled;
        self
    }

    /// Get the field delimiter
    #[must_use]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Check if records end with CRLF
    #[must_use]
    pub fn is_crlf(&self) -> bool {
        self.crlf
    }

    fn builder(&self) -> WriterBuilder {
        let mut builder = WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .terminator(if self.crlf {
                Terminator::CRLF
            } else {
                Terminator::Any(b'\n')
            });
        builder
    }
}

/// Encode the header and rows as CSV
///
/// Each row is written in header order; a column the row lacks is written
/// as an empty field.
pub fn encode_csv(
    header: &[String],
    rows: &[ExportRow],
    config: Option<&CsvWriterConfig>,
) -> Result<Bytes> {
    let default_config = CsvWriterConfig::default();
    let config = config.unwrap_or(&default_config);

    let mut writer = config.builder().from_writer(Vec::new());

    writer
        .write_record(header)
        .map_err(|e| Error::output(format!("Failed to write CSV header: {e}")))?;

    for row in rows {
        writer
            .write_record(
                header
                    .iter()
                    .map(|column| render_cell(row.get(column)).into_owned()),
            )
            .map_err(|e| Error::output(format!("Failed to write CSV row: {e}")))?;
    }

    let data = writer
        .into_inner()
        .map_err(|e| Error::output(format!("Failed to flush CSV writer: {e}")))?;

    Ok(Bytes::from(data))
}

/// Text of one CSV cell
pub fn render_cell(value: Option<&JsonValue>) -> Cow<'_, str> {
    match value {
        None | Some(JsonValue::Null) => Cow::Borrowed(""),
        Some(JsonValue::String(s)) => Cow::Borrowed(s),
        Some(JsonValue::Bool(true)) => Cow::Borrowed("true"),
        Some(JsonValue::Bool(false)) => Cow::Borrowed("false"),
        Some(other) => Cow::Owned(other.to_string()),
    }
}
