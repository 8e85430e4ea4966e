//! # Sales Forecasting
//!
//! Umbrella crate for the sales forecasting workspace.
//!
//! - [`math`]: numeric building blocks (regression, Fourier terms, trends)
//! - [`forecast`]: loading, cleaning, filtering and forecasting sales
//! - [`dashboard`]: charts, HTML dashboard, reports and the HTTP server
//!
//! ## Example
//!
//! ```
//! use sales_forecasting::forecast::data::{ColumnMapping, DataLoader};
//! use sales_forecasting::forecast::models::{ForecastModel, SeasonalTrend, TrainedForecastModel};
//! use sales_forecasting::forecast::synthetic::generate_sales_csv;
//!
//! let csv = generate_sales_csv(60, 1).unwrap();
//! let data = DataLoader::from_bytes(csv.into_bytes(), &ColumnMapping::default()).unwrap();
//! let series = data.daily_series();
//!
//! let forecast = SeasonalTrend::new().train(&series).unwrap().forecast(90).unwrap();
//! assert_eq!(forecast.future_only().len(), 90);
//! ```

pub use sales_dashboard as dashboard;
pub use sales_forecast as forecast;
pub use sales_math as math;
