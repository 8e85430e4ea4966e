//! Utility functions for the sales_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date-time layouts accepted for order dates, tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Date-only layouts accepted for order dates
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

/// Parse an order date, returning `None` for anything unrecognised.
///
/// Mirrors a coercing datetime conversion: bad values become nulls instead
/// of failing the whole load.
pub fn parse_order_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Parse a `YYYY-MM-DD` parameter, failing loudly
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        ForecastError::InvalidParameter(format!("Invalid date '{}': {}", raw, e))
    })
}

/// Daily dates following `last`, `periods` of them
pub fn future_dates(last: NaiveDate, periods: usize) -> Vec<NaiveDate> {
    (1..=periods as i64)
        .map(|i| last + Duration::days(i))
        .collect()
}

/// Split a sequence into a leading training part and a trailing test part
pub fn train_test_split<T: Clone>(data: &[T], test_len: usize) -> (Vec<T>, Vec<T>) {
    if test_len == 0 || test_len >= data.len() {
        return (data.to_vec(), Vec::new());
    }

    let train_len = data.len() - test_len;
    (data[..train_len].to_vec(), data[train_len..].to_vec())
}

/// Weekday / weekend classification of a calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    /// Classify a date; Saturday and Sunday are weekend days
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => DayType::Weekend,
            _ => DayType::Weekday,
        }
    }

    /// Parse the query-string form (`weekday` / `weekend`)
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "weekday" => Ok(DayType::Weekday),
            "weekend" => Ok(DayType::Weekend),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unknown day type: {}",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayType::Weekday => "weekday",
            DayType::Weekend => "weekend",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayType::Weekday => write!(f, "Weekday"),
            DayType::Weekend => write!(f, "Weekend"),
        }
    }
}
