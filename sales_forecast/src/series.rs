//! Daily time series built from aggregated sales

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use sales_math::moving_averages::rolling_mean;
use sales_math::regression::LinearRegression;
use sales_math::stats;
use serde::{Deserialize, Serialize};

/// A `(date, value)` pair used as model input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub ds: NaiveDate,
    pub y: f64,
}

impl TimeSeriesPoint {
    pub fn new(ds: NaiveDate, y: f64) -> Self {
        Self { ds, y }
    }
}

/// Strictly increasing daily observations.
///
/// Days without orders are absent rather than zero-filled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    points: Vec<TimeSeriesPoint>,
}

impl DailySeries {
    /// Build from unordered points; dates must be unique
    pub fn new(mut points: Vec<TimeSeriesPoint>) -> Result<Self> {
        points.sort_by_key(|p| p.ds);
        if let Some(dup) = points.windows(2).find(|w| w[0].ds == w[1].ds) {
            return Err(ForecastError::DataError(format!(
                "Duplicate date in series: {}",
                dup[0].ds
            )));
        }
        Ok(Self { points })
    }

    /// Build from dates and values of equal length
    pub fn from_parts(dates: &[NaiveDate], values: &[f64]) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::ValidationError(format!(
                "Dates length ({}) doesn't match values length ({})",
                dates.len(),
                values.len()
            )));
        }
        Self::new(
            dates
                .iter()
                .zip(values)
                .map(|(&ds, &y)| TimeSeriesPoint::new(ds, y))
                .collect(),
        )
    }

    /// Caller guarantees strictly increasing dates
    pub(crate) fn from_sorted(points: Vec<TimeSeriesPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].ds < w[1].ds));
        Self { points }
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.ds).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.ds)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.ds)
    }

    /// Calendar days from first to last observation
    pub fn span_days(&self) -> i64 {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => (last - first).num_days(),
            _ => 0,
        }
    }

    /// Value observed on `date`, if any
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.ds)
            .ok()
            .map(|idx| self.points[idx].y)
    }

    /// Points in `[start, end)`; `end = None` runs to the end
    pub fn slice(&self, start: usize, end: Option<usize>) -> Result<Self> {
        let end = end.unwrap_or(self.points.len());
        if start > end || end > self.points.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Slice {}..{} out of bounds for series of length {}",
                start,
                end,
                self.points.len()
            )));
        }
        Ok(Self {
            points: self.points[start..end].to_vec(),
        })
    }

    /// Split into the first `n` points and the rest
    pub fn split_at(&self, n: usize) -> (Self, Self) {
        let n = n.min(self.points.len());
        (
            Self {
                points: self.points[..n].to_vec(),
            },
            Self {
                points: self.points[n..].to_vec(),
            },
        )
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.y).sum()
    }

    pub fn mean(&self) -> Result<f64> {
        Ok(stats::mean(&self.values())?)
    }

    pub fn std_dev(&self) -> Result<f64> {
        Ok(stats::std_dev(&self.values())?)
    }

    /// Least-squares slope in sales per calendar day
    pub fn daily_growth(&self) -> Result<f64> {
        let first = self.first_date().ok_or_else(|| {
            ForecastError::InsufficientData("Empty series has no trend".to_string())
        })?;
        let x: Vec<f64> = self
            .points
            .iter()
            .map(|p| (p.ds - first).num_days() as f64)
            .collect();
        Ok(LinearRegression::fit(&x, &self.values())?.slope())
    }

    /// Trailing mean over `window` observations
    pub fn rolling_mean(&self, window: usize) -> Result<Vec<Option<f64>>> {
        Ok(rolling_mean(&self.values(), window)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, d).unwrap()
    }

    fn sample() -> DailySeries {
        DailySeries::from_parts(
            &[date(1, 3), date(1, 1), date(1, 2)],
            &[106.0, 100.0, 103.0],
        )
        .unwrap()
    }

    #[test]
    fn test_new_sorts_points() {
        let series = sample();
        assert_eq!(series.dates(), vec![date(1, 1), date(1, 2), date(1, 3)]);
        assert_eq!(series.values(), vec![100.0, 103.0, 106.0]);
        assert_eq!(series.span_days(), 2);
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let result = DailySeries::from_parts(&[date(1, 1), date(1, 1)], &[1.0, 2.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_slice_and_split() {
        let series = sample();
        assert_eq!(series.slice(1, Some(3)).unwrap().len(), 2);
        assert!(series.slice(2, Some(5)).is_err());

        let (train, test) = series.split_at(2);
        assert_eq!(train.len(), 2);
        assert_eq!(test.dates(), vec![date(1, 3)]);
    }

    #[test]
    fn test_statistics() {
        let series = sample();
        assert_relative_eq!(series.mean().unwrap(), 103.0);
        assert_relative_eq!(series.daily_growth().unwrap(), 3.0, epsilon = 1e-9);
        assert_eq!(series.value_on(date(1, 2)), Some(103.0));
        assert_eq!(series.value_on(date(2, 2)), None);
    }
}
