//! Inclusive calendar date ranges.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};

use super::ConfigError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// An inclusive `(start, end)` pair of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvertedRange {
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parses an explicit `YYYY-MM-DD` pair.
    pub fn parse(start: &str, end: &str) -> Result<Self, ConfigError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Returns the last full calendar month before `today`.
    ///
    /// `2024-03-15` resolves to `2024-02-01..=2024-02-29`.
    pub fn last_full_month(today: NaiveDate) -> Self {
        let first_of_current = today - Duration::days(i64::from(today.day0()));
        let end = first_of_current - Duration::days(1);
        let start = end - Duration::days(i64::from(end.day0()));
        Self { start, end }
    }

    /// First day of the range.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range (inclusive).
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns true if `date` falls within the range, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `YYYY-MM` label when the range covers exactly one calendar month.
    pub fn month_label(&self) -> Option<String> {
        let whole_month = self.start.day() == 1
            && self.start.year() == self.end.year()
            && self.start.month() == self.end.month()
            && (self.end + Duration::days(1)).day() == 1;
        whole_month.then(|| self.start.format("%Y-%m").to_string())
    }

    /// Lower bound for `git log --since`.
    ///
    /// git compares it with the committer date in the local timezone, so it
    /// starts a day early and [`contains`](Self::contains) on the author date
    /// decides membership. There is no matching `--until`: commits rebased or
    /// merged after the range ends still carry an in-range author date.
    pub fn git_since(&self) -> String {
        let start = self.start - Duration::days(1);
        format!("{}T00:00:00", start.format(DATE_FORMAT))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ConfigError::InvalidDate {
        value: value.to_string(),
    })
}
