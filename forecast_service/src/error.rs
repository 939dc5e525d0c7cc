//! Error types for the forecast_service crate

use price_math::MathError;
use thiserror::Error;

/// Custom error types for the forecast_service crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// The series is too short for the requested model
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The series carries no variation the model could fit
    #[error("Degenerate series: {0}")]
    DegenerateSeries(String),

    /// Parameter estimation did not reach a usable optimum
    #[error("Model fit failed to converge: {0}")]
    ConvergenceFailure(String),

    /// The model produced NaN or infinite predictions
    #[error("Forecast contains non-finite values")]
    NonFiniteForecast,

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No price history exists for the crop
    #[error("Unknown crop: {0}")]
    UnknownCrop(String),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}
