//! # Price Math
//!
//! Numerical kernels used by the crop price forecasting models.
//! Everything here works on plain `f64` slices and has no knowledge of
//! crops, providers or HTTP.

use thiserror::Error;

pub mod autoregression;
pub mod differencing;
pub mod linalg;
pub mod optimize;
pub mod stats;

/// Errors that can occur in numerical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Singular matrix: {0}")]
    SingularMatrix(String),
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;
