use forecast_service::error::ForecastError;
use price_math::MathError;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);
    assert!(matches!(forecast_error, ForecastError::IoError(_)));

    let math_error = MathError::SingularMatrix("pivot".to_string());
    let forecast_error = ForecastError::from(math_error);
    match forecast_error {
        ForecastError::MathError(MathError::SingularMatrix(msg)) => assert_eq!(msg, "pivot"),
        other => panic!("Expected MathError variant, got {:?}", other),
    }
}

#[test]
fn test_error_display() {
    let error = ForecastError::InvalidParameter("horizon must be positive".to_string());
    assert!(error.to_string().contains("horizon must be positive"));

    let error = ForecastError::InsufficientData {
        required: 15,
        actual: 4,
    };
    let message = error.to_string();
    assert!(message.contains("15"));
    assert!(message.contains("4"));

    let error = ForecastError::DegenerateSeries("flat".to_string());
    assert!(error.to_string().starts_with("Degenerate series"));

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error = ForecastError::from(io_error);
    let error_string = format!("{}", error);
    assert!(error_string.contains("IO error"));
    assert!(error_string.contains("permission denied"));
}

#[test]
fn test_non_finite_forecast_message() {
    let error = ForecastError::NonFiniteForecast;
    assert_eq!(error.to_string(), "Forecast contains non-finite values");
}
