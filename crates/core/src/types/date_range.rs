//! Inclusive send-date range.
//!
//! Dates are naive calendar dates. No timezone conversion is performed: the
//! query boundaries are the literal start of the first day and one second
//! before the start of the day after the last day.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Last representable second of a day.
const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// Format of the `since_send_time` / `before_send_time` query values.
const QUERY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format accepted for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors that can occur when building a [`DateRange`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum DateRangeError {
    /// A date did not match `YYYY-MM-DD`.
    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },
    /// The start date falls after the end date.
    #[error("start date {start} is after end date {end}")]
    Inverted {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },
}

/// An inclusive range of calendar dates.
///
/// ## Examples
///
/// ```
/// use campaign_report_core::DateRange;
///
/// let range = DateRange::parse("2024-03-01", "2024-03-10").unwrap();
/// assert_eq!(range.since_send_time_param(), "2024-03-01T00:00:00");
/// assert_eq!(range.before_send_time_param(), "2024-03-10T23:59:59");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a date range.
    ///
    /// # Errors
    ///
    /// Returns [`DateRangeError::Inverted`] if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse a date range from two `YYYY-MM-DD` strings.
    ///
    /// # Errors
    ///
    /// Returns an error if either date is malformed or the range is inverted.
    pub fn parse(start: &str, end: &str) -> Result<Self, DateRangeError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Lower query boundary: the start of the first day.
    #[must_use]
    pub fn since_send_time(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Upper query boundary: one second before the day after the last day.
    #[must_use]
    pub fn before_send_time(&self) -> NaiveDateTime {
        self.end.and_time(END_OF_DAY)
    }

    /// `since_send_time` formatted for the provider query string.
    #[must_use]
    pub fn since_send_time_param(&self) -> String {
        self.since_send_time().format(QUERY_TIMESTAMP_FORMAT).to_string()
    }

    /// `before_send_time` formatted for the provider query string.
    #[must_use]
    pub fn before_send_time_param(&self) -> String {
        self.before_send_time()
            .format(QUERY_TIMESTAMP_FORMAT)
            .to_string()
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DateRangeError::InvalidDate {
        value: value.to_owned(),
    })
}
