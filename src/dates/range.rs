//! Date range validation for select criteria

use super::parse::{end_of_day, format_iso, start_of_day, DateParser};
use crate::error::{Error, Result};
use crate::types::{Criteria, CriteriaValue, END_DATE_KEY, START_DATE_KEY};
use chrono::{DateTime, FixedOffset, Utc};

/// Which of the two range keys are present
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRangeState {
    /// Neither key; nothing to validate
    NoCriteria,
    /// Only `startDate`
    OnlyStart(String),
    /// Only `endDate`
    OnlyEnd(String),
    /// Both keys, raw values
    BothPresent {
        /// Raw start value
        start: String,
        /// Raw end value
        end: String,
    },
}

impl DateRangeState {
    /// Classify the criteria
    pub fn from_criteria(criteria: &Criteria) -> Result<Self> {
        let start = raw_value(criteria, START_DATE_KEY)?;
        let end = raw_value(criteria, END_DATE_KEY)?;
        Ok(match (start, end) {
            (None, None) => DateRangeState::NoCriteria,
            (Some(start), None) => DateRangeState::OnlyStart(start),
            (None, Some(end)) => DateRangeState::OnlyEnd(end),
            (Some(start), Some(end)) => DateRangeState::BothPresent { start, end },
        })
    }
}

/// A checked, end-inclusive date range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRange {
    /// Start date as parsed
    pub start: DateTime<FixedOffset>,
    /// Last instant of the end date's day
    pub end: DateTime<FixedOffset>,
    /// Offset of the start date; used to display `created`
    pub display_offset: FixedOffset,
}

impl ValidatedRange {
    /// 00:00:00 of the start day
    pub fn lower_bound(&self) -> DateTime<FixedOffset> {
        start_of_day(&self.start)
    }

    /// Lower bound formatted for binding
    pub fn start_binding(&self) -> String {
        format_iso(&self.lower_bound())
    }

    /// Upper bound formatted for binding
    pub fn end_binding(&self) -> String {
        format_iso(&self.end)
    }
}

/// Validates the `startDate`/`endDate` pair of a criteria map
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRangeValidator {
    parser: DateParser,
}

impl DateRangeValidator {
    /// Create a validator with the default parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific parser
    #[must_use]
    pub fn with_parser(mut self, parser: DateParser) -> Self {
        self.parser = parser;
        self
    }

    /// Validate against the current time
    pub fn validate(&self, criteria: &Criteria) -> Result<Option<ValidatedRange>> {
        self.validate_at(criteria, Utc::now())
    }

    /// Validate against `now`
    ///
    /// Returns `None` when the criteria carry no date range at all.
    pub fn validate_at(
        &self,
        criteria: &Criteria,
        now: DateTime<Utc>,
    ) -> Result<Option<ValidatedRange>> {
        let (raw_start, raw_end) = match DateRangeState::from_criteria(criteria)? {
            DateRangeState::NoCriteria => return Ok(None),
            DateRangeState::OnlyStart(_) => {
                return Err(Error::IncompleteDateRange {
                    present: START_DATE_KEY.to_string(),
                    missing: END_DATE_KEY.to_string(),
                })
            }
            DateRangeState::OnlyEnd(_) => {
                return Err(Error::IncompleteDateRange {
                    present: END_DATE_KEY.to_string(),
                    missing: START_DATE_KEY.to_string(),
                })
            }
            DateRangeState::BothPresent { start, end } => (start, end),
        };

        let start = self
            .parser
            .parse_at(&raw_start, now)
            .ok_or_else(|| Error::invalid_date(START_DATE_KEY, raw_start.as_str()))?;

        let end = self
            .parser
            .parse_at(&raw_end, now)
            .map(|dt| end_of_day(&dt))
            .ok_or_else(|| Error::invalid_date(END_DATE_KEY, raw_end.as_str()))?;

        if start > now {
            return Err(Error::FutureStartDate { value: raw_start });
        }

        if start_of_day(&start) > end {
            return Err(Error::InvertedRange {
                start: raw_start,
                end: raw_end,
            });
        }

        tracing::debug!(
            start = %format_iso(&start_of_day(&start)),
            end = %format_iso(&end),
            "Validated date range"
        );

        Ok(Some(ValidatedRange {
            start,
            end,
            display_offset: *start.offset(),
        }))
    }
}

fn raw_value(criteria: &Criteria, key: &str) -> Result<Option<String>> {
    match criteria.get(key) {
        None => Ok(None),
        Some(CriteriaValue::Scalar(serde_json::Value::String(s))) => Ok(Some(s.clone())),
        Some(CriteriaValue::Scalar(serde_json::Value::Null)) => Ok(None),
        Some(CriteriaValue::Scalar(other)) => Err(Error::invalid_date(key, other.to_string())),
        Some(CriteriaValue::List(items)) => Err(Error::invalid_date(
            key,
            serde_json::Value::Array(items.clone()).to_string(),
        )),
    }
}
