//! Join forecast rows with observed daily totals

use crate::error::Result;
use crate::models::Forecast;
use crate::series::DailySeries;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

/// A forecast row alongside the observed value for the same day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MergedRow {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    /// Observed total; `None` for future days and gaps
    pub actual: Option<f64>,
    /// `actual - yhat` when observed
    pub residual: Option<f64>,
}

impl MergedRow {
    pub fn within_interval(&self) -> Option<bool> {
        self.actual
            .map(|a| self.yhat_lower <= a && a <= self.yhat_upper)
    }
}

/// Left join of the forecast onto actuals by date, in forecast order
pub fn merge_forecast_with_actuals(forecast: &Forecast, actuals: &DailySeries) -> Vec<MergedRow> {
    forecast
        .rows()
        .iter()
        .map(|row| {
            let actual = actuals.value_on(row.ds);
            MergedRow {
                ds: row.ds,
                yhat: row.yhat,
                yhat_lower: row.yhat_lower,
                yhat_upper: row.yhat_upper,
                actual,
                residual: actual.map(|a| a - row.yhat),
            }
        })
        .collect()
}

/// Write merged rows as CSV; missing actuals become empty fields
pub fn write_merged_csv<W: Write>(rows: &[MergedRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Component, ForecastRow};
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 5, d).unwrap()
    }

    fn row(d: u32, yhat: f64) -> ForecastRow {
        ForecastRow {
            ds: date(d),
            yhat,
            yhat_lower: yhat - 5.0,
            yhat_upper: yhat + 5.0,
            trend: yhat,
            weekly: 0.0,
            yearly: 0.0,
        }
    }

    #[test]
    fn test_left_join_keeps_forecast_order() {
        let forecast = Forecast::new(
            "test",
            vec![row(3, 30.0), row(1, 10.0), row(4, 40.0)],
            date(3),
            vec![Component::Trend],
        );
        let actuals = DailySeries::from_parts(&[date(1), date(2), date(3)], &[12.0, 20.0, 20.0]).unwrap();

        let merged = merge_forecast_with_actuals(&forecast, &actuals);
        let dates: Vec<NaiveDate> = merged.iter().map(|m| m.ds).collect();
        assert_eq!(dates, vec![date(3), date(1), date(4)]);

        assert_eq!(merged[0].actual, Some(20.0));
        assert_eq!(merged[0].residual, Some(-10.0));
        assert_eq!(merged[0].within_interval(), Some(false));
        assert_eq!(merged[1].residual, Some(2.0));
        assert_eq!(merged[1].within_interval(), Some(true));
        assert_eq!(merged[2].actual, None);
        assert_eq!(merged[2].residual, None);
    }

    #[test]
    fn test_write_merged_csv() {
        let forecast = Forecast::new("test", vec![row(1, 10.0), row(2, 20.0)], date(1), vec![]);
        let actuals = DailySeries::from_parts(&[date(1)], &[12.5]).unwrap();
        let merged = merge_forecast_with_actuals(&forecast, &actuals);

        let mut out = Vec::new();
        write_merged_csv(&merged, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "ds,yhat,yhat_lower,yhat_upper,actual,residual");
        assert_eq!(lines[1], "2023-05-01,10.0,5.0,15.0,12.5,2.5");
        assert_eq!(lines[2], "2023-05-02,20.0,15.0,25.0,,");
    }
}
