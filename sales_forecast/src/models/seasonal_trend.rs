//! Additive trend + seasonality model
//!
//! `y(t) = trend(t) + weekly(t) + yearly(t) + noise`
//!
//! The trend is piecewise linear with automatically placed changepoints; the
//! seasonal terms are truncated Fourier series. All coefficients are fitted
//! jointly by penalised least squares: the changepoint rate adjustments get
//! a tight prior so the trend only bends where the data insists, the
//! seasonal coefficients a loose one.

use crate::error::{ForecastError, Result};
use crate::models::{
    interval_z, steps_ahead, validate_interval_width, Component, Forecast, ForecastModel,
    ForecastRow, TrainedForecastModel, DEFAULT_INTERVAL_WIDTH,
};
use crate::series::DailySeries;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use sales_math::fourier::{evaluate, fourier_series};
use sales_math::regression::ridge_least_squares;
use sales_math::stats;
use sales_math::trend::{changepoint_locations, changepoint_matrix, piecewise_linear};

const WEEKLY_PERIOD: f64 = 7.0;
const WEEKLY_ORDER: usize = 3;
const YEARLY_PERIOD: f64 = 365.25;
const YEARLY_ORDER: usize = 10;

/// Lower bound on the scaled noise level used for the priors
const PRIOR_SIGMA_FLOOR: f64 = 0.01;

/// Minimum history span before `Auto` turns a seasonality on
const WEEKLY_AUTO_MIN_DAYS: i64 = 14;
const YEARLY_AUTO_MIN_DAYS: i64 = 730;

/// Whether a seasonal component is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seasonality {
    /// Fit when the history is long enough to identify it
    Auto,
    Enabled,
    Disabled,
}

impl Seasonality {
    fn resolve(self, span_days: i64, min_days: i64) -> bool {
        match self {
            Seasonality::Auto => span_days >= min_days,
            Seasonality::Enabled => true,
            Seasonality::Disabled => false,
        }
    }
}

/// Trend + seasonality model configuration
#[derive(Debug, Clone)]
pub struct SeasonalTrend {
    name: String,
    n_changepoints: usize,
    changepoint_range: f64,
    changepoint_prior_scale: f64,
    seasonality_prior_scale: f64,
    weekly: Seasonality,
    yearly: Seasonality,
    interval_width: f64,
}

impl Default for SeasonalTrend {
    fn default() -> Self {
        Self::new()
    }
}

impl SeasonalTrend {
    /// Defaults: 25 changepoints in the first 80% of the history,
    /// changepoint prior 0.05, seasonality prior 10, 80% intervals
    pub fn new() -> Self {
        Self {
            name: "Seasonal Trend".to_string(),
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            weekly: Seasonality::Auto,
            yearly: Seasonality::Auto,
            interval_width: DEFAULT_INTERVAL_WIDTH,
        }
    }

    pub fn with_changepoints(mut self, n: usize) -> Self {
        self.n_changepoints = n;
        self
    }

    pub fn with_changepoint_range(mut self, range: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&range) {
            return Err(ForecastError::InvalidParameter(format!(
                "Changepoint range must be within [0, 1], got {}",
                range
            )));
        }
        self.changepoint_range = range;
        Ok(self)
    }

    pub fn with_changepoint_prior_scale(mut self, scale: f64) -> Result<Self> {
        self.changepoint_prior_scale = positive("Changepoint prior scale", scale)?;
        Ok(self)
    }

    pub fn with_seasonality_prior_scale(mut self, scale: f64) -> Result<Self> {
        self.seasonality_prior_scale = positive("Seasonality prior scale", scale)?;
        Ok(self)
    }

    pub fn with_weekly(mut self, weekly: Seasonality) -> Self {
        self.weekly = weekly;
        self
    }

    pub fn with_yearly(mut self, yearly: Seasonality) -> Self {
        self.yearly = yearly;
        self
    }

    pub fn with_interval_width(mut self, width: f64) -> Result<Self> {
        validate_interval_width(width)?;
        self.interval_width = width;
        Ok(self)
    }

    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }
}

fn positive(what: &str, value: f64) -> Result<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ForecastError::InvalidParameter(format!(
            "{} must be positive, got {}",
            what, value
        )))
    }
}

/// Column layout of the design matrix
#[derive(Debug, Clone)]
struct Layout {
    changepoints: Vec<f64>,
    weekly: bool,
    yearly: bool,
}

impl Layout {
    fn width(&self) -> usize {
        2 + self.changepoints.len()
            + if self.weekly { 2 * WEEKLY_ORDER } else { 0 }
            + if self.yearly { 2 * YEARLY_ORDER } else { 0 }
    }

    /// Row for one observation: `[1, t, a_j(t)·(t − s_j)…, weekly…, yearly…]`
    fn rows(&self, t: &[f64], t_days: &[f64]) -> Result<Vec<Vec<f64>>> {
        let weekly = if self.weekly {
            Some(fourier_series(t_days, WEEKLY_PERIOD, WEEKLY_ORDER)?)
        } else {
            None
        };
        let yearly = if self.yearly {
            Some(fourier_series(t_days, YEARLY_PERIOD, YEARLY_ORDER)?)
        } else {
            None
        };
        let indicators = changepoint_matrix(t, &self.changepoints);

        Ok(t.iter()
            .enumerate()
            .map(|(i, &ti)| {
                let mut row = Vec::with_capacity(self.width());
                row.push(1.0);
                row.push(ti);
                row.extend(
                    indicators[i]
                        .iter()
                        .zip(&self.changepoints)
                        .map(|(a, &cp)| a * (ti - cp)),
                );
                if let Some(w) = &weekly {
                    row.extend_from_slice(&w[i]);
                }
                if let Some(y) = &yearly {
                    row.extend_from_slice(&y[i]);
                }
                row
            })
            .collect())
    }

    fn penalties(&self, sigma: f64, changepoint_scale: f64, seasonality_scale: f64) -> Vec<f64> {
        // Gaussian-prior MAP: penalty = noise variance / prior variance
        let noise = sigma.max(PRIOR_SIGMA_FLOOR).powi(2);
        let mut p = vec![0.0, 0.0];
        p.extend(std::iter::repeat(noise / changepoint_scale.powi(2)).take(self.changepoints.len()));
        let seasonal = self.width() - p.len();
        p.extend(std::iter::repeat(noise / seasonality_scale.powi(2)).take(seasonal));
        p
    }
}

impl ForecastModel for SeasonalTrend {
    type Trained = TrainedSeasonalTrend;

    fn train(&self, series: &DailySeries) -> Result<Self::Trained> {
        if series.len() < 2 {
            return Err(ForecastError::InsufficientData(format!(
                "Need at least 2 daily observations to fit, got {}",
                series.len()
            )));
        }
        let (Some(t0), Some(last)) = (series.first_date(), series.last_date()) else {
            return Err(ForecastError::EmptyData("Empty series".to_string()));
        };
        let span_days = (last - t0).num_days();

        let values = series.values();
        let y_scale = values
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
            .max(f64::MIN_POSITIVE);
        let ys: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let t_days: Vec<f64> = series
            .dates()
            .iter()
            .map(|d| (*d - t0).num_days() as f64)
            .collect();
        let t: Vec<f64> = t_days.iter().map(|d| d / span_days as f64).collect();

        let layout = Layout {
            changepoints: changepoint_locations(&t, self.n_changepoints, self.changepoint_range)?,
            weekly: self.weekly.resolve(span_days, WEEKLY_AUTO_MIN_DAYS),
            yearly: self.yearly.resolve(span_days, YEARLY_AUTO_MIN_DAYS),
        };
        let design = layout.rows(&t, &t_days)?;

        // First pass uses the raw spread as the noise guess, the second the
        // residual scale of the first fit.
        let mut sigma = stats::std_dev(&ys)?.max(1e-3);
        let mut beta = Vec::new();
        for _ in 0..2 {
            let penalties = layout.penalties(
                sigma,
                self.changepoint_prior_scale,
                self.seasonality_prior_scale,
            );
            beta = ridge_least_squares(&design, &ys, &penalties)?;
            let residuals: Vec<f64> = design
                .iter()
                .zip(&ys)
                .map(|(row, y)| y - row.iter().zip(&beta).map(|(x, b)| x * b).sum::<f64>())
                .collect();
            sigma = stats::root_mean_square(&residuals)?.max(1e-6);
        }

        let n_cp = layout.changepoints.len();
        let mut offset = 2 + n_cp;
        let weekly_beta = if layout.weekly {
            let b = beta[offset..offset + 2 * WEEKLY_ORDER].to_vec();
            offset += 2 * WEEKLY_ORDER;
            Some(b)
        } else {
            None
        };
        let yearly_beta = if layout.yearly {
            Some(beta[offset..offset + 2 * YEARLY_ORDER].to_vec())
        } else {
            None
        };

        tracing::debug!(
            observations = series.len(),
            changepoints = n_cp,
            weekly = layout.weekly,
            yearly = layout.yearly,
            sigma = sigma * y_scale,
            "fitted seasonal trend model"
        );

        Ok(TrainedSeasonalTrend {
            name: self.name.clone(),
            history: series.clone(),
            t0,
            span_days: span_days as f64,
            y_scale,
            m: beta[0],
            k: beta[1],
            delta: beta[2..2 + n_cp].to_vec(),
            changepoints: layout.changepoints,
            weekly_beta,
            yearly_beta,
            sigma,
            z: interval_z(self.interval_width)?,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fitted trend + seasonality model
#[derive(Debug, Clone)]
pub struct TrainedSeasonalTrend {
    name: String,
    history: DailySeries,
    t0: NaiveDate,
    span_days: f64,
    y_scale: f64,
    m: f64,
    k: f64,
    delta: Vec<f64>,
    changepoints: Vec<f64>,
    weekly_beta: Option<Vec<f64>>,
    yearly_beta: Option<Vec<f64>>,
    /// Residual standard deviation on the scaled data
    sigma: f64,
    z: f64,
}

impl TrainedSeasonalTrend {
    fn t_days(&self, dates: &[NaiveDate]) -> Vec<f64> {
        dates
            .iter()
            .map(|d| (*d - self.t0).num_days() as f64)
            .collect()
    }

    fn seasonal(&self, t_days: &[f64], beta: &Option<Vec<f64>>, period: f64, order: usize) -> Result<Vec<f64>> {
        match beta {
            Some(b) => Ok(evaluate(&fourier_series(t_days, period, order)?, b)
                .into_iter()
                .map(|v| v * self.y_scale)
                .collect()),
            None => Ok(vec![0.0; t_days.len()]),
        }
    }

    /// Dates of the fitted changepoints
    pub fn changepoint_dates(&self) -> Vec<NaiveDate> {
        self.changepoints
            .iter()
            .map(|cp| self.t0 + Duration::days((cp * self.span_days).round() as i64))
            .collect()
    }

    /// Growth rate change at each changepoint, in sales per day
    pub fn rate_changes(&self) -> Vec<f64> {
        self.delta
            .iter()
            .map(|d| d * self.y_scale / self.span_days)
            .collect()
    }

    /// Residual standard deviation in sales units
    pub fn residual_std(&self) -> f64 {
        self.sigma * self.y_scale
    }

    /// Weekly effect for Monday..Sunday, if fitted
    pub fn weekly_profile(&self) -> Result<Option<Vec<(Weekday, f64)>>> {
        if self.weekly_beta.is_none() {
            return Ok(None);
        }
        let monday = self.t0 - Duration::days(self.t0.weekday().num_days_from_monday() as i64);
        let dates: Vec<NaiveDate> = (0..7).map(|i| monday + Duration::days(i)).collect();
        let values = self.seasonal(&self.t_days(&dates), &self.weekly_beta, WEEKLY_PERIOD, WEEKLY_ORDER)?;
        Ok(Some(
            dates
                .iter()
                .map(|d| d.weekday())
                .zip(values)
                .collect(),
        ))
    }

    /// Yearly effect for each day of a non-leap year, if fitted
    pub fn yearly_profile(&self) -> Result<Option<Vec<(u32, f64)>>> {
        if self.yearly_beta.is_none() {
            return Ok(None);
        }
        // 2001 is not a leap year; the phase only depends on the offset to t0
        let Some(jan1) = NaiveDate::from_ymd_opt(2001, 1, 1) else {
            return Ok(None);
        };
        let dates: Vec<NaiveDate> = (0..365).map(|i| jan1 + Duration::days(i)).collect();
        let values = self.seasonal(&self.t_days(&dates), &self.yearly_beta, YEARLY_PERIOD, YEARLY_ORDER)?;
        Ok(Some(
            dates.iter().map(|d| d.ordinal()).zip(values).collect(),
        ))
    }
}

impl TrainedForecastModel for TrainedSeasonalTrend {
    fn predict(&self, dates: &[NaiveDate]) -> Result<Forecast> {
        let history_end = self
            .history
            .last_date()
            .ok_or_else(|| ForecastError::EmptyData("Model has no history".to_string()))?;
        let n = self.history.len() as f64;

        let t_days = self.t_days(dates);
        let t: Vec<f64> = t_days.iter().map(|d| d / self.span_days).collect();
        let trend: Vec<f64> = piecewise_linear(self.k, self.m, &self.delta, &t, &self.changepoints)
            .into_iter()
            .map(|v| v * self.y_scale)
            .collect();
        let weekly = self.seasonal(&t_days, &self.weekly_beta, WEEKLY_PERIOD, WEEKLY_ORDER)?;
        let yearly = self.seasonal(&t_days, &self.yearly_beta, YEARLY_PERIOD, YEARLY_ORDER)?;

        let rows = dates
            .iter()
            .enumerate()
            .map(|(i, &ds)| {
                let yhat = trend[i] + weekly[i] + yearly[i];
                let h = steps_ahead(ds, history_end);
                let margin = self.z * self.residual_std() * (1.0 + h / n).sqrt();
                ForecastRow {
                    ds,
                    yhat,
                    yhat_lower: yhat - margin,
                    yhat_upper: yhat + margin,
                    trend: trend[i],
                    weekly: weekly[i],
                    yearly: yearly[i],
                }
            })
            .collect();

        let mut components = vec![Component::Trend];
        if self.weekly_beta.is_some() {
            components.push(Component::Weekly);
        }
        if self.yearly_beta.is_some() {
            components.push(Component::Yearly);
        }

        Ok(Forecast::new(self.name.clone(), rows, history_end, components))
    }

    fn history(&self) -> &DailySeries {
        &self.history
    }

    fn name(&self) -> &str {
        &self.name
    }
}
