//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastRow, TrainedForecastModel};
use crate::series::DailySeries;
use serde::Serialize;
use std::fmt;

/// Forecast accuracy metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

/// Compare forecast values against actual values
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = forecast.len() as f64;
    let errors: Vec<f64> = forecast
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;
    let rmse = mse.sqrt();

    // MAPE over non-zero actuals only
    let (ape_sum, ape_count) = actual
        .iter()
        .zip(errors.iter())
        .filter(|(&a, _)| a != 0.0)
        .fold((0.0, 0usize), |(sum, count), (&a, &e)| {
            (sum + e.abs() / a.abs() * 100.0, count + 1)
        });
    let mape = if ape_count > 0 {
        ape_sum / ape_count as f64
    } else {
        0.0
    };

    let smape = actual
        .iter()
        .zip(forecast.iter())
        .map(|(&a, &f)| {
            let denom = a.abs() + f.abs();
            if denom == 0.0 {
                0.0
            } else {
                200.0 * (a - f).abs() / denom
            }
        })
        .sum::<f64>()
        / n;

    Ok(ForecastAccuracy {
        mae,
        mse,
        rmse,
        mape,
        smape,
    })
}

/// Share of actual values falling inside the prediction interval
pub fn interval_coverage(rows: &[ForecastRow], actual: &[f64]) -> Result<f64> {
    if rows.len() != actual.len() || rows.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast rows and actual values must have the same non-zero length".to_string(),
        ));
    }

    let inside = rows
        .iter()
        .zip(actual)
        .filter(|(row, &a)| row.yhat_lower <= a && a <= row.yhat_upper)
        .count();
    Ok(inside as f64 / rows.len() as f64)
}

/// Out-of-sample score of one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub model_name: String,
    pub train_len: usize,
    pub test_len: usize,
    pub accuracy: ForecastAccuracy,
    /// Share of held-out actuals inside the interval
    pub coverage: f64,
}

/// Train on all but the last `test_days` points and score the forecast on them
pub fn holdout_evaluation<M: ForecastModel>(
    model: &M,
    series: &DailySeries,
    test_days: usize,
) -> Result<EvaluationReport> {
    if test_days == 0 || test_days >= series.len() {
        return Err(ForecastError::InsufficientData(format!(
            "Holdout of {} days needs a longer series than {} points",
            test_days,
            series.len()
        )));
    }

    let (train, test) = series.split_at(series.len() - test_days);
    let trained = model.train(&train)?;
    let forecast = trained.predict(&test.dates())?;
    let actual = test.values();

    let accuracy = forecast_accuracy(&forecast.values(), &actual)?;
    let coverage = interval_coverage(forecast.rows(), &actual)?;

    tracing::info!(
        model = model.name(),
        train = train.len(),
        test = test.len(),
        rmse = accuracy.rmse,
        coverage,
        "holdout evaluation"
    );

    Ok(EvaluationReport {
        model_name: model.name().to_string(),
        train_len: train.len(),
        test_len: test.len(),
        accuracy,
        coverage,
    })
}

impl fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  MAE:     {:.4}", self.mae)?;
        writeln!(f, "  MSE:     {:.4}", self.mse)?;
        writeln!(f, "  RMSE:    {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:    {:.4}%", self.mape)?;
        writeln!(f, "  SMAPE:   {:.4}%", self.smape)?;
        Ok(())
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} (train {} days, test {} days):",
            self.model_name, self.train_len, self.test_len
        )?;
        write!(f, "{}", self.accuracy)?;
        writeln!(f, "  Coverage: {:.2}%", self.coverage * 100.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forecast_accuracy() {
        let accuracy = forecast_accuracy(&[110.0, 90.0], &[100.0, 100.0]).unwrap();
        assert_relative_eq!(accuracy.mae, 10.0);
        assert_relative_eq!(accuracy.mse, 100.0);
        assert_relative_eq!(accuracy.rmse, 10.0);
        assert_relative_eq!(accuracy.mape, 10.0);
    }

    #[test]
    fn test_mape_skips_zero_actuals() {
        let accuracy = forecast_accuracy(&[5.0, 110.0], &[0.0, 100.0]).unwrap();
        assert_relative_eq!(accuracy.mape, 10.0);
        // zero actual vs non-zero forecast is a full 200% symmetric error
        assert_relative_eq!(accuracy.smape, (200.0 + 200.0 * 10.0 / 210.0) / 2.0);
    }

    #[test]
    fn test_mismatched_lengths() {
        assert!(forecast_accuracy(&[1.0], &[1.0, 2.0]).is_err());
        assert!(forecast_accuracy(&[], &[]).is_err());
    }
}
