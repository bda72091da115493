//! Output module
//!
//! Encodes reconciled rows as CSV and writes them to an export sink.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Parsing `<protocol>://<path>` export paths
//! - Encoding rows as CSV
//! - Writing to the local filesystem or S3

mod cloud;
mod sink;
mod target;
mod writer;

pub use cloud::S3Sink;
pub use sink::{build_sink, build_sink_with_config, ExportSink, FileSystemSink};
pub use target::{randomize_path, unique_token, ExportTarget, Protocol};
pub use writer::{encode_csv, render_cell, CsvWriterConfig};
