//! Cell parsers for dates, counts and money.
//!
//! Source cells are free text. Every parser returns `None` for empty or
//! malformed input; callers decide whether absence is worth an issue.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Parses a date cell, trying each `chrono` format in order.
///
/// A trailing `HH:MM:SS` time component is accepted and dropped.
///
/// # Examples
///
/// ```
/// use benefit_engine::ingest::parse_date;
/// use chrono::NaiveDate;
///
/// let formats = vec!["%m/%d/%Y".to_string(), "%Y-%m-%d".to_string()];
/// assert_eq!(
///     parse_date("05/10/2025", &formats),
///     NaiveDate::from_ymd_opt(2025, 5, 10)
/// );
/// assert_eq!(
///     parse_date("2025-05-10 00:00:00", &formats),
///     NaiveDate::from_ymd_opt(2025, 5, 10)
/// );
/// assert_eq!(parse_date("not a date", &formats), None);
/// ```
pub fn parse_date(cell: &str, formats: &[String]) -> Option<NaiveDate> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    formats.iter().find_map(|format| {
        NaiveDate::parse_from_str(cell, format).ok().or_else(|| {
            NaiveDateTime::parse_from_str(cell, &format!("{} %H:%M:%S", format))
                .ok()
                .map(|dt| dt.date())
        })
    })
}

/// Parses a non-negative integer count.
///
/// Integral float renderings such as `"10.0"` are accepted.
///
/// # Examples
///
/// ```
/// use benefit_engine::ingest::parse_count;
///
/// assert_eq!(parse_count("10"), Some(10));
/// assert_eq!(parse_count(" 22.0 "), Some(22));
/// assert_eq!(parse_count("2.5"), None);
/// assert_eq!(parse_count("-1"), None);
/// ```
pub fn parse_count(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    if let Ok(value) = cell.parse::<u32>() {
        return Some(value);
    }

    let value = Decimal::from_str(cell).ok()?;
    if value.is_sign_negative() || !value.fract().is_zero() {
        return None;
    }
    value.to_u32()
}

/// Parses a monetary cell such as `"R$ 37,50"`, `"1.234,56"` or `"35.00"`.
///
/// # Examples
///
/// ```
/// use benefit_engine::ingest::parse_money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_money("R$ 37,50"), Some(Decimal::new(3750, 2)));
/// assert_eq!(parse_money("1.234,56"), Some(Decimal::new(123456, 2)));
/// assert_eq!(parse_money("35.00"), Some(Decimal::new(3500, 2)));
/// assert_eq!(parse_money("n/a"), None);
/// ```
pub fn parse_money(cell: &str) -> Option<Decimal> {
    let cleaned: String = cell
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    Decimal::from_str(&normalized).ok()
}
