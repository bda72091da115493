//! Error types for Solidafy Export
//!
//! This module defines the error hierarchy for the whole exporter.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Every variant belongs to exactly one [`ErrorKind`], which is what callers
//! should match on when they only care about the category of failure.

use thiserror::Error;

/// The main error type for Solidafy Export
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// General configuration problem
    #[error("Configuration error: {message}")]
    Config {
        /// Description
        message: String,
    },

    /// A required job field is empty
    #[error("Missing required config field: {field}")]
    MissingConfigField {
        /// Field name
        field: String,
    },

    /// Export path is not `<protocol>://<path>`
    #[error("Unsupported export path format: '{path}'. Should be in form '<protocol>://<path>', ex: 'file:///var/tmp/out.csv'")]
    MalformedExportPath {
        /// Path as given
        path: String,
    },

    /// Export path names an unknown protocol
    #[error("Unsupported export target type: '{protocol}'. Supported target types are {supported}")]
    UnsupportedProtocol {
        /// Protocol as given
        protocol: String,
        /// Comma-separated supported protocols
        supported: String,
    },

    /// Job file is not valid YAML
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Validation Errors
    // ============================================================================
    /// A date criterion could not be parsed
    #[error("{field} failed to parse with data '{value}'")]
    InvalidDate {
        /// Criteria key
        field: String,
        /// Raw value
        value: String,
    },

    /// Only one end of the date range was given
    #[error("{present} exists without {missing}")]
    IncompleteDateRange {
        /// Key that was given
        present: String,
        /// Key that was missing
        missing: String,
    },

    /// Range starts after the current time
    #[error("startDate '{value}' is in the future")]
    FutureStartDate {
        /// Raw start value
        value: String,
    },

    /// Range starts after it ends
    #[error("startDate '{start}' is after endDate '{end}'")]
    InvertedRange {
        /// Raw start value
        start: String,
        /// Raw end value
        end: String,
    },

    /// A criteria value has an unsupported shape
    #[error("Invalid criteria for '{column}': {message}")]
    InvalidCriteria {
        /// Criteria key
        column: String,
        /// Description
        message: String,
    },

    // ============================================================================
    // Data Shape Errors
    // ============================================================================
    /// Query result is empty or not a list of rows
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description
        message: String,
    },

    /// JSON input could not be parsed
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    /// Underlying I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Destination missing or not writable
    #[error("Target for output '{path}' not found or not writable")]
    Unwritable {
        /// Destination path
        path: String,
    },

    /// Encoding or upload failure
    #[error("Output error: {message}")]
    Output {
        /// Description
        message: String,
    },

    // ============================================================================
    // Query Errors
    // ============================================================================
    /// Statement preparation or execution failed
    #[error("Query error: {message}")]
    Query {
        /// Description
        message: String,
    },
}

/// Category of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed export path, missing wiring, bad job file
    Configuration,
    /// Malformed or inconsistent select/date criteria
    Validation,
    /// Query returned nothing usable
    DataShape,
    /// Destination unwritable or write failure
    Io,
    /// Statement preparation or execution failure
    Query,
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid date error
    pub fn invalid_date(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidDate {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an invalid criteria error
    pub fn invalid_criteria(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCriteria {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input (data shape) error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an unwritable destination error
    pub fn unwritable(path: impl Into<String>) -> Self {
        Self::Unwritable { path: path.into() }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create a query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Category this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::MalformedExportPath { .. }
            | Error::UnsupportedProtocol { .. }
            | Error::YamlParse(_) => ErrorKind::Configuration,
            Error::InvalidDate { .. }
            | Error::IncompleteDateRange { .. }
            | Error::FutureStartDate { .. }
            | Error::InvertedRange { .. }
            | Error::InvalidCriteria { .. } => ErrorKind::Validation,
            Error::InvalidInput { .. } | Error::JsonParse(_) => ErrorKind::DataShape,
            Error::Io(_) | Error::Unwritable { .. } | Error::Output { .. } => ErrorKind::Io,
            Error::Query { .. } => ErrorKind::Query,
        }
    }

    /// Check if this error came from bad criteria
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// Result type alias for Solidafy Export
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Output {
                message: format!("{}: {}", message.into(), inner),
            }
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Output {
                message: format!("{}: {}", f(), inner),
            }
        })
    }
}
