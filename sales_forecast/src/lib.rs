//! # Sales Forecast
//!
//! Cleaning, aggregation and forecasting of order-level sales data.
//!
//! ## Features
//!
//! - CSV loading with header trimming, column renaming (`ORDERDATE` → `ds`,
//!   `SALES` → `y`), coercing date parsing and null dropping
//! - Daily aggregation and weekday/weekend summaries
//! - Multi-select filters over product line, country, deal size, status and
//!   territory
//! - An additive trend + weekly + yearly seasonality model with prediction
//!   intervals, plus a moving average baseline
//! - Hold-out accuracy metrics and forecast/actual merging
//!
//! ## Quick Start
//!
//! ```no_run
//! use sales_forecast::data::DataLoader;
//! use sales_forecast::models::{ForecastModel, SeasonalTrend, TrainedForecastModel};
//!
//! let data = DataLoader::from_csv("sales_data_sample.csv")?;
//! let series = data.daily_series();
//!
//! let model = SeasonalTrend::new().train(&series)?;
//! let forecast = model.forecast(90)?;
//! for row in forecast.future_only().iter().take(5) {
//!     println!("{} {:.2} [{:.2}, {:.2}]", row.ds, row.yhat, row.yhat_lower, row.yhat_upper);
//! }
//! # Ok::<(), sales_forecast::ForecastError>(())
//! ```

pub mod data;
pub mod error;
pub mod filters;
pub mod merge;
pub mod metrics;
pub mod models;
pub mod series;
pub mod synthetic;
pub mod utils;

// Re-export commonly used types
pub use crate::data::{ColumnMapping, DataLoader, Dimension, SalesData, SalesRecord};
pub use crate::error::{ForecastError, Result};
pub use crate::filters::SalesFilter;
pub use crate::models::{Forecast, ForecastModel, ForecastRow, TrainedForecastModel};
pub use crate::series::{DailySeries, TimeSeriesPoint};
pub use crate::utils::DayType;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
