//! Inclusive calendar-day ranges

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{CellarSyncError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive `[start, end]` range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// # Errors
    /// `InvalidInput` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(CellarSyncError::InvalidInput(format!(
                "range start {start} is after range end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from two `YYYY-MM-DD` strings.
    ///
    /// # Errors
    /// `InvalidInput` when either date is malformed or the range is inverted.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_day(start)?, parse_day(end)?)
    }

    /// The `days` most recent days ending at `end` (inclusive of both ends,
    /// so the range spans `days + 1` calendar days).
    pub fn trailing(end: NaiveDate, days: i64) -> Self {
        let start = end.checked_sub_signed(Duration::days(days.max(0))).unwrap_or(end);
        Self { start, end }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of calendar days covered.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Parse a `YYYY-MM-DD` day.
///
/// # Errors
/// `InvalidInput` when the string is not a valid calendar date.
pub fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|err| {
        CellarSyncError::InvalidInput(format!("invalid date '{value}', expected YYYY-MM-DD: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_accepts_iso_days() {
        let range = DateRange::parse("2024-06-01", "2024-06-30").unwrap();
        assert_eq!(range.start, day(2024, 6, 1));
        assert_eq!(range.len_days(), 30);
        assert!(range.contains(day(2024, 6, 30)));
        assert!(!range.contains(day(2024, 7, 1)));
    }

    #[test]
    fn parse_rejects_malformed_and_inverted_ranges() {
        assert!(matches!(
            DateRange::parse("06/01/2024", "2024-06-30"),
            Err(CellarSyncError::InvalidInput(_))
        ));
        assert!(matches!(
            DateRange::parse("2024-02-30", "2024-03-01"),
            Err(CellarSyncError::InvalidInput(_))
        ));
        assert!(matches!(
            DateRange::parse("2024-07-01", "2024-06-01"),
            Err(CellarSyncError::InvalidInput(_))
        ));
    }

    #[test]
    fn trailing_window_ends_on_given_day() {
        let range = DateRange::trailing(day(2024, 6, 8), 7);
        assert_eq!(range.start, day(2024, 6, 1));
        assert_eq!(range.end, day(2024, 6, 8));
    }
}
