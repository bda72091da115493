//! Date handling module
//!
//! Parsing of free-form date criteria and validation of the
//! `startDate`/`endDate` range.
//!
//! # Overview
//!
//! - `DateParser` - accepts ISO-8601, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS±HH:MM`
//!   and a few relative words (`now`, `today`, ...)
//! - `DateRangeValidator` - checks the range in order: start parses, end parses
//!   (advanced to end of day), start not in the future, start day not after end
//! - Day-bound and formatting helpers shared with the query builder and the
//!   `created` column formatter

mod parse;
mod range;

pub use parse::{
    end_of_day, format_display, format_iso, parse_offset, start_of_day, utc_offset, DateParser,
    DISPLAY_FORMAT, ISO_FORMAT,
};
pub use range::{DateRangeState, DateRangeValidator, ValidatedRange};
