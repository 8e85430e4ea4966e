use sales_forecast::error::ForecastError;
use sales_math::MathError;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);

    match forecast_error {
        ForecastError::IoError(_) => {}
        _ => panic!("Expected IoError variant"),
    }

    let math_error = MathError::InsufficientData("two points needed".to_string());
    match ForecastError::from(math_error) {
        ForecastError::MathError(MathError::InsufficientData(msg)) => {
            assert_eq!(msg, "two points needed")
        }
        other => panic!("Expected MathError variant, got {:?}", other),
    }
}

#[test]
fn test_error_display() {
    let error = ForecastError::InvalidParameter("window must be positive".to_string());
    let error_string = format!("{}", error);
    assert!(error_string.contains("window must be positive"));

    let error = ForecastError::MissingColumns(vec!["ORDERDATE".to_string()]);
    assert_eq!(error.to_string(), "Required column 'ORDERDATE' not found");

    let error = ForecastError::MissingColumns(vec!["ORDERDATE".to_string(), "SALES".to_string()]);
    assert_eq!(error.to_string(), "Required columns 'ORDERDATE' and 'SALES' not found");

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error_string = ForecastError::from(io_error).to_string();
    assert!(error_string.contains("IO error"));
    assert!(error_string.contains("permission denied"));
}
