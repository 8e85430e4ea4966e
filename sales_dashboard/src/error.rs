//! Error types for the dashboard

use crate::config::ConfigError;
use sales_forecast::ForecastError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The filter selection left no orders
    #[error("No orders match the current filter selection")]
    EmptySelection,

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    /// Whether the error was caused by request input rather than the server
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DashboardError::EmptySelection
                | DashboardError::Forecast(
                    ForecastError::InvalidParameter(_)
                        | ForecastError::InsufficientData(_)
                        | ForecastError::EmptyData(_)
                )
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
