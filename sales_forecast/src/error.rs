//! Error types for the sales_forecast crate

use polars::prelude::PolarsError;
use sales_math::MathError;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Required input columns are absent
    #[error("Required {} not found", describe_columns(.0))]
    MissingColumns(Vec<String>),

    /// Nothing left to work with after cleaning or filtering
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Too few observations for the requested operation
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Error related to validation of inputs against each other
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from numeric routines
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from CSV export
    #[error("CSV error: {0}")]
    CsvError(String),
}

fn describe_columns(columns: &[String]) -> String {
    let quoted: Vec<String> = columns.iter().map(|c| format!("'{}'", c)).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => {
            format!("columns {} and {}", rest.join(", "), last)
        }
        Some((only, _)) => format!("column {}", only),
        None => "columns".to_string(),
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}
