//! Forecasting models for daily sales

use crate::error::{ForecastError, Result};
use crate::series::DailySeries;
use crate::utils::future_dates;
use chrono::NaiveDate;
use sales_math::stats::normal_quantile;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::io::Write;

/// Default share of the predictive distribution covered by the interval
pub const DEFAULT_INTERVAL_WIDTH: f64 = 0.80;

/// Additive components a model can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Trend,
    Weekly,
    Yearly,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Trend => write!(f, "trend"),
            Component::Weekly => write!(f, "weekly"),
            Component::Yearly => write!(f, "yearly"),
        }
    }
}

/// One predicted day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub trend: f64,
    pub weekly: f64,
    pub yearly: f64,
}

/// Predictions for a run of dates
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    model_name: String,
    rows: Vec<ForecastRow>,
    history_end: NaiveDate,
    components: Vec<Component>,
}

impl Forecast {
    pub fn new(
        model_name: impl Into<String>,
        rows: Vec<ForecastRow>,
        history_end: NaiveDate,
        components: Vec<Component>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            rows,
            history_end,
            components,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Last observed date of the training history
    pub fn history_end(&self) -> NaiveDate {
        self.history_end
    }

    /// Components with a non-trivial contribution
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn has_component(&self, component: Component) -> bool {
        self.components.contains(&component)
    }

    /// Rows strictly after the training history
    pub fn future_only(&self) -> &[ForecastRow] {
        let start = self
            .rows
            .iter()
            .position(|r| r.ds > self.history_end)
            .unwrap_or(self.rows.len());
        &self.rows[start..]
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.ds).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.yhat).collect()
    }

    /// Write all rows as CSV with a header
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Predict the given dates; dates inside the history are in-sample fits
    fn predict(&self, dates: &[NaiveDate]) -> Result<Forecast>;

    /// Series the model was trained on
    fn history(&self) -> &DailySeries;

    /// Name of the model
    fn name(&self) -> &str;

    /// Daily dates past the history, optionally preceded by the history dates
    fn make_future_dates(&self, periods: usize, include_history: bool) -> Vec<NaiveDate> {
        let history = self.history();
        let mut dates = if include_history {
            history.dates()
        } else {
            Vec::new()
        };
        if let Some(last) = history.last_date() {
            dates.extend(future_dates(last, periods));
        }
        dates
    }

    /// Predict the history plus `horizon` future days
    fn forecast(&self, horizon: usize) -> Result<Forecast> {
        self.predict(&self.make_future_dates(horizon, true))
    }
}

/// Forecast model that can be trained on a daily series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a daily series
    fn train(&self, series: &DailySeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// z-score for a central interval of the given width
pub(crate) fn interval_z(width: f64) -> Result<f64> {
    validate_interval_width(width)?;
    Ok(normal_quantile((1.0 + width) / 2.0)?)
}

pub(crate) fn validate_interval_width(width: f64) -> Result<()> {
    if width > 0.0 && width < 1.0 {
        Ok(())
    } else {
        Err(ForecastError::InvalidParameter(format!(
            "Interval width must be between 0 and 1, got {}",
            width
        )))
    }
}

/// Days past the end of the history, zero inside it
pub(crate) fn steps_ahead(date: NaiveDate, history_end: NaiveDate) -> f64 {
    (date - history_end).num_days().max(0) as f64
}

pub mod moving_average;
pub mod seasonal_trend;

pub use moving_average::MovingAverage;
pub use seasonal_trend::{SeasonalTrend, Seasonality, TrainedSeasonalTrend};
