//! Moving average baseline
//!
//! Forecasts every future day at the mean of the last `window` observations.
//! In-sample values are trailing means, with the first days falling back to
//! the mean of whatever history is available.

use crate::error::{ForecastError, Result};
use crate::models::{
    interval_z, steps_ahead, validate_interval_width, Component, Forecast, ForecastModel,
    ForecastRow, TrainedForecastModel, DEFAULT_INTERVAL_WIDTH,
};
use crate::series::DailySeries;
use chrono::NaiveDate;
use sales_math::moving_averages::SimpleMovingAverage;
use sales_math::stats;

/// Moving average model
#[derive(Debug, Clone)]
pub struct MovingAverage {
    /// Name of the model
    name: String,
    /// Window size
    window: usize,
    interval_width: f64,
}

/// Trained moving average model
#[derive(Debug, Clone)]
pub struct TrainedMovingAverage {
    name: String,
    window: usize,
    history: DailySeries,
    /// Trailing mean known before each history day
    fitted: Vec<f64>,
    /// Mean of the last `window` observations
    level: f64,
    /// Standard deviation of one-step-ahead errors
    sigma: f64,
    z: f64,
}

impl MovingAverage {
    /// Create a new moving average model
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Window size must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Moving Average (window={})", window),
            window,
            interval_width: DEFAULT_INTERVAL_WIDTH,
        })
    }

    pub fn with_interval_width(mut self, width: f64) -> Result<Self> {
        validate_interval_width(width)?;
        self.interval_width = width;
        Ok(self)
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl ForecastModel for MovingAverage {
    type Trained = TrainedMovingAverage;

    fn train(&self, series: &DailySeries) -> Result<Self::Trained> {
        if series.len() < self.window {
            return Err(ForecastError::InsufficientData(format!(
                "Need at least {} observations for a {}-day moving average, got {}",
                self.window,
                self.window,
                series.len()
            )));
        }

        let values = series.values();
        let mut sma = SimpleMovingAverage::new(self.window)?;
        let mut fitted = Vec::with_capacity(values.len());
        let mut running_sum = 0.0;

        for (i, &value) in values.iter().enumerate() {
            // One-step-ahead prediction uses only earlier days
            let prediction = if i == 0 {
                value
            } else if i < self.window {
                running_sum / i as f64
            } else {
                sma.value()?
            };
            fitted.push(prediction);
            running_sum += value;
            sma.update(value);
        }

        let level = sma.value()?;
        let errors: Vec<f64> = values
            .iter()
            .zip(&fitted)
            .skip(1)
            .map(|(a, f)| a - f)
            .collect();
        let sigma = if errors.is_empty() {
            0.0
        } else {
            stats::root_mean_square(&errors)?
        };

        Ok(TrainedMovingAverage {
            name: self.name.clone(),
            window: self.window,
            history: series.clone(),
            fitted,
            level,
            sigma,
            z: interval_z(self.interval_width)?,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedMovingAverage {
    pub fn window(&self) -> usize {
        self.window
    }

    /// Flat level used for every future day
    pub fn level(&self) -> f64 {
        self.level
    }
}

impl TrainedForecastModel for TrainedMovingAverage {
    fn predict(&self, dates: &[NaiveDate]) -> Result<Forecast> {
        let history_end = self
            .history
            .last_date()
            .ok_or_else(|| ForecastError::EmptyData("Model has no history".to_string()))?;

        let rows = dates
            .iter()
            .map(|&ds| {
                let (yhat, margin) = if ds <= history_end {
                    let idx = self
                        .history
                        .points()
                        .partition_point(|p| p.ds < ds)
                        .min(self.fitted.len().saturating_sub(1));
                    (self.fitted[idx], self.z * self.sigma)
                } else {
                    // Errors of a flat forecast accumulate like a random walk
                    let h = steps_ahead(ds, history_end);
                    (self.level, self.z * self.sigma * h.sqrt())
                };
                ForecastRow {
                    ds,
                    yhat,
                    yhat_lower: yhat - margin,
                    yhat_upper: yhat + margin,
                    trend: yhat,
                    weekly: 0.0,
                    yearly: 0.0,
                }
            })
            .collect();

        Ok(Forecast::new(
            self.name.clone(),
            rows,
            history_end,
            vec![Component::Trend],
        ))
    }

    fn history(&self) -> &DailySeries {
        &self.history
    }

    fn name(&self) -> &str {
        &self.name
    }
}
