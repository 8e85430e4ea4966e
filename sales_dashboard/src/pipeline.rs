//! One full dashboard computation: filter, aggregate, fit, forecast, score

use crate::config::ForecastConfig;
use crate::error::{DashboardError, Result};
use chrono::{NaiveDate, Weekday};
use sales_forecast::data::{DayTypeSummary, Dimension, SalesData};
use sales_forecast::merge::{merge_forecast_with_actuals, MergedRow};
use sales_forecast::metrics::{holdout_evaluation, EvaluationReport};
use sales_forecast::models::{
    Forecast, ForecastModel, ForecastRow, MovingAverage, SeasonalTrend, TrainedForecastModel,
};
use sales_forecast::series::{DailySeries, TimeSeriesPoint};
use sales_forecast::SalesFilter;
use serde::Serialize;

/// Rows shown in the cleaned data preview
pub const HEAD_ROWS: usize = 5;

/// Selectable values of one dimension
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub dimension: Dimension,
    pub values: Vec<String>,
}

/// Everything the page, the charts and the JSON API render
#[derive(Debug, Clone)]
pub struct DashboardModel {
    pub filter: SalesFilter,
    pub options: Vec<FilterOptions>,
    /// Full date range of the loaded data
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    pub source_rows: usize,
    pub dropped_rows: usize,
    pub filtered_rows: usize,
    pub head: Vec<TimeSeriesPoint>,
    pub series: DailySeries,
    pub forecast: Forecast,
    pub merged: Vec<MergedRow>,
    pub weekly_profile: Option<Vec<(Weekday, f64)>>,
    pub yearly_profile: Option<Vec<(u32, f64)>>,
    pub evaluations: Vec<EvaluationReport>,
    pub day_types: Vec<DayTypeSummary>,
    pub horizon_days: usize,
}

impl DashboardModel {
    /// Forecast rows past the last observed day
    pub fn horizon(&self) -> &[ForecastRow] {
        self.forecast.future_only()
    }
}

/// Selectable values for every dimension present in the data
pub fn filter_options(data: &SalesData) -> Vec<FilterOptions> {
    data.available_dimensions()
        .into_iter()
        .map(|dimension| FilterOptions {
            dimension,
            values: data.distinct_values(dimension),
        })
        .collect()
}

/// Seasonal model configured from the dashboard settings
pub fn seasonal_model(config: &ForecastConfig) -> Result<SeasonalTrend> {
    Ok(SeasonalTrend::new()
        .with_interval_width(config.interval_width)?
        .with_changepoint_prior_scale(config.changepoint_prior_scale)?
        .with_seasonality_prior_scale(config.seasonality_prior_scale)?)
}

/// Run the whole pipeline for one filter selection
pub fn build_dashboard(
    data: &SalesData,
    filter: &SalesFilter,
    config: &ForecastConfig,
) -> Result<DashboardModel> {
    let options = filter_options(data);

    let filtered = filter.apply(data);
    if filtered.is_empty() {
        return Err(DashboardError::EmptySelection);
    }
    let series = filtered.daily_series();

    let model = seasonal_model(config)?;
    let trained = model.train(&series)?;
    let forecast = trained.forecast(config.horizon_days)?;
    let merged = merge_forecast_with_actuals(&forecast, &series);

    tracing::info!(
        orders = filtered.len(),
        days = series.len(),
        horizon = config.horizon_days,
        "computed forecast"
    );

    Ok(DashboardModel {
        filter: filter.clone(),
        options,
        date_bounds: data.date_range(),
        source_rows: data.source_rows(),
        dropped_rows: data.dropped_rows(),
        filtered_rows: filtered.len(),
        head: filtered.head(HEAD_ROWS),
        weekly_profile: trained.weekly_profile()?,
        yearly_profile: trained.yearly_profile()?,
        evaluations: evaluate_models(&model, &series, config),
        day_types: filtered.weekday_weekend_summary(),
        series,
        forecast,
        merged,
        horizon_days: config.horizon_days,
    })
}

/// Hold-out scores for the seasonal model and the baseline.
///
/// Models that cannot be scored on this series are left out of the table.
pub fn evaluate_models(
    model: &SeasonalTrend,
    series: &DailySeries,
    config: &ForecastConfig,
) -> Vec<EvaluationReport> {
    let mut reports = Vec::new();
    // at least two holdout lengths of history before scoring
    if series.len() < 3 * config.holdout_days.max(1) {
        tracing::debug!(
            days = series.len(),
            holdout = config.holdout_days,
            "series too short for holdout evaluation"
        );
        return reports;
    }

    match holdout_evaluation(model, series, config.holdout_days) {
        Ok(report) => reports.push(report),
        Err(err) => tracing::warn!(error = %err, "seasonal model evaluation failed"),
    }
    match MovingAverage::new(config.baseline_window)
        .and_then(|baseline| holdout_evaluation(&baseline, series, config.holdout_days))
    {
        Ok(report) => reports.push(report),
        Err(err) => tracing::warn!(error = %err, "baseline evaluation failed"),
    }
    reports
}
