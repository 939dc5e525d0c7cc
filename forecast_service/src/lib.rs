//! # Forecast Service
//!
//! Short-horizon crop price forecasting.
//!
//! ## Features
//!
//! - Daily price series (`PriceSeries`) with optional calendar dates
//! - Pluggable price history providers (random placeholder, fixed, CSV feed)
//! - ARIMA models fitted by conditional sum of squares
//! - Point forecasts with normal-theory confidence intervals
//!
//! ## Quick Start
//!
//! ```rust
//! use forecast_service::providers::RandomPriceProvider;
//! use forecast_service::ForecastService;
//! use std::sync::Arc;
//!
//! let provider = Arc::new(RandomPriceProvider::new().with_seed(42));
//! let service = ForecastService::new(provider)?;
//!
//! let forecast = service.forecast("wheat")?;
//! assert_eq!(forecast.values().len(), 7);
//! # Ok::<(), forecast_service::ForecastError>(())
//! ```

pub mod data;
pub mod error;
pub mod models;
pub mod providers;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use crate::data::{DataLoader, PriceSeries};
pub use crate::error::ForecastError;
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::providers::PriceProvider;
pub use crate::service::{ForecastService, ForecastSettings};

/// Version of the forecasting library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
