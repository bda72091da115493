//! Extraction module
//!
//! Parses each row's JSON payload column into flat fields and reconciles the
//! field sets across rows into one canonical, sorted header.
//!
//! # Overview
//!
//! - Pass 1: decode payloads, record an `Issue` for unusable rows, union
//!   the keys into the canonical column set
//! - Pass 2 (only when rows diverged): back-fill missing columns with null

mod reconciler;
mod types;

pub use reconciler::{reconcile, RowExtractor};
pub use types::{CreatedField, ExportRow, Extraction, Issue};

#[cfg(test)]
mod tests;
