//! Free-form date parsing and day-bound helpers

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};

/// Formats carrying an explicit UTC offset
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %:z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%#z",
];

/// Date-time formats without an offset
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Date-only formats
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// ISO-8601 with numeric offset, used for bound query parameters
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Human-readable pattern for the exported `created` column
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %I:%M:%S %P";

/// General date parser
///
/// Inputs without an explicit offset are read in `default_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParser {
    default_offset: FixedOffset,
}

impl Default for DateParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DateParser {
    /// Create a parser that reads naive inputs as UTC
    pub fn new() -> Self {
        Self {
            default_offset: utc_offset(),
        }
    }

    /// Set the offset used for inputs without one
    #[must_use]
    pub fn with_default_offset(mut self, offset: FixedOffset) -> Self {
        self.default_offset = offset;
        self
    }

    /// Offset applied to naive inputs
    pub fn default_offset(&self) -> FixedOffset {
        self.default_offset
    }

    /// Parse relative to the current time
    pub fn parse(&self, input: &str) -> Option<DateTime<FixedOffset>> {
        self.parse_at(input, Utc::now())
    }

    /// Parse relative to `now` (only matters for `now`/`today`/...)
    pub fn parse_at(&self, input: &str, now: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Some(dt) = self.parse_relative(input, now) {
            return Some(dt);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Some(dt);
        }

        for format in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(input, format) {
                return Some(dt);
            }
        }

        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
                return Some(self.localize(naive));
            }
        }

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(input, format) {
                return Some(self.localize(date.and_time(NaiveTime::MIN)));
            }
        }

        None
    }

    fn parse_relative(&self, input: &str, now: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
        let now = now.with_timezone(&self.default_offset);
        match input.to_ascii_lowercase().as_str() {
            "now" => Some(now),
            "today" | "midnight" => Some(start_of_day(&now)),
            "yesterday" => Some(start_of_day(&now) - Duration::days(1)),
            "tomorrow" => Some(start_of_day(&now) + Duration::days(1)),
            _ => None,
        }
    }

    fn localize(&self, naive: NaiveDateTime) -> DateTime<FixedOffset> {
        DateTime::from_naive_utc_and_offset(naive - self.default_offset, self.default_offset)
    }
}

/// The zero offset
pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// 00:00:00 of the same calendar day, in the same offset
pub fn start_of_day(dt: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    *dt - dt.time().signed_duration_since(NaiveTime::MIN)
}

/// Last instant of the same calendar day, in the same offset
pub fn end_of_day(dt: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    start_of_day(dt) + Duration::days(1) - Duration::nanoseconds(1)
}

/// Format as ISO-8601 with a numeric offset (`2015-04-01T00:00:00+00:00`)
pub fn format_iso(dt: &DateTime<FixedOffset>) -> String {
    dt.format(ISO_FORMAT).to_string()
}

/// Format in `offset` using the `YYYY-MM-DD hh:mm:ss am/pm` pattern
pub fn format_display(dt: &DateTime<FixedOffset>, offset: FixedOffset) -> String {
    dt.with_timezone(&offset).format(DISPLAY_FORMAT).to_string()
}

/// Parse a `±HH:MM` / `±HHMM` / `Z` / `UTC` offset string
pub fn parse_offset(input: &str) -> Option<FixedOffset> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("z") || input.eq_ignore_ascii_case("utc") {
        return Some(utc_offset());
    }

    let (sign, rest) = match input.as_bytes().first()? {
        b'+' => (1, &input[1..]),
        b'-' => (-1, &input[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
