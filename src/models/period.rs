//! Reference period model.
//!
//! This module contains the [`ReferencePeriod`] type: the calendar month
//! for which benefits are being calculated.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A calendar month for which days payable are computed.
///
/// Serialized as `"YYYY-MM"`.
///
/// # Example
///
/// ```
/// use benefit_engine::models::ReferencePeriod;
/// use chrono::NaiveDate;
///
/// let period: ReferencePeriod = "2025-05".parse().unwrap();
/// assert_eq!(period.first_day(), NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
/// assert_eq!(period.last_day(), NaiveDate::from_ymd_opt(2025, 5, 31).unwrap());
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2025, 5, 15).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferencePeriod {
    first_day: NaiveDate,
}

impl ReferencePeriod {
    /// Creates a period for the given year and month, if the month is valid.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    /// The period containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first_day: date.with_day(1).unwrap_or(date),
        }
    }

    /// The first day of the period.
    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// The last day of the period.
    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.first_day.month() == 12 {
            (self.first_day.year() + 1, 1)
        } else {
            (self.first_day.year(), self.first_day.month() + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .unwrap_or(self.first_day)
    }

    /// Checks whether a date falls within the period (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }
}

impl fmt::Display for ReferencePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}",
            self.first_day.year(),
            self.first_day.month()
        )
    }
}

impl FromStr for ReferencePeriod {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidPeriod {
            value: value.to_string(),
        };

        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;

        ReferencePeriod::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ReferencePeriod {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReferencePeriod> for String {
    fn from(period: ReferencePeriod) -> Self {
        period.to_string()
    }
}
