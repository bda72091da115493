//! Export path URIs
//!
//! Export destinations are written as `<protocol>://<path>`, e.g.
//! `file:///var/data/csv/leadgen99.csv` or `s3://bucket/exports/leadgen99.csv`.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static TARGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<protocol>\w+)://(?P<path>.+)$").expect("export path pattern is valid")
});

/// Supported export destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Local filesystem
    File,
    /// Amazon S3 (or compatible)
    S3,
}

impl Protocol {
    /// All supported protocols
    pub const SUPPORTED: [Protocol; 2] = [Protocol::File, Protocol::S3];

    /// Scheme name
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::File => "file",
            Protocol::S3 => "s3",
        }
    }

    fn from_scheme(scheme: &str) -> Option<Self> {
        Self::SUPPORTED
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(scheme))
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed export destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    protocol: Protocol,
    path: String,
}

impl ExportTarget {
    /// Parse `<protocol>://<path>`; the protocol is case-insensitive
    pub fn parse(uri: &str) -> Result<Self> {
        let captures = TARGET_RE
            .captures(uri.trim())
            .ok_or_else(|| Error::MalformedExportPath {
                path: uri.to_string(),
            })?;

        let scheme = &captures["protocol"];
        let protocol =
            Protocol::from_scheme(scheme).ok_or_else(|| Error::UnsupportedProtocol {
                protocol: scheme.to_lowercase(),
                supported: Protocol::SUPPORTED
                    .iter()
                    .map(Protocol::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;

        Ok(Self {
            protocol,
            path: captures["path"].to_string(),
        })
    }

    /// Parsed protocol
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Path with the protocol stripped
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Check if this is an S3 destination
    pub fn is_s3(&self) -> bool {
        self.protocol == Protocol::S3
    }
}

impl std::fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.protocol, self.path)
    }
}

/// Insert a unique token between the file stem and its extension
///
/// `/var/data/leadgen99.csv` becomes `/var/data/leadgen99-<token>.csv`.
pub fn randomize_path(path: &str) -> String {
    let token = unique_token();
    let (dir, file) = match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path),
    };
    match file.rfind('.') {
        Some(idx) if idx > 0 => {
            let (stem, ext) = file.split_at(idx);
            format!("{dir}{stem}-{token}{ext}")
        }
        _ => format!("{dir}{file}-{token}"),
    }
}

/// Short random token for output file names
pub fn unique_token() -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(13);
    token
}
