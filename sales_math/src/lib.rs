//! # Sales Math
//!
//! Numeric building blocks for the sales forecasting models.
//! This crate provides the linear algebra, Fourier features, piecewise
//! trend helpers and descriptive statistics used by `sales_forecast`.

use thiserror::Error;

pub mod fourier;
pub mod moving_averages;
pub mod regression;
pub mod stats;
pub mod trend;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
