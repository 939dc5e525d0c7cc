//! # Crop Forecast
//!
//! Umbrella crate for the crop price forecasting workspace.
//!
//! - [`math`]: numerical kernels (differencing, autoregression, optimisation)
//! - [`service`]: price providers, the ARIMA model and the forecast service
//! - [`server`]: the HTTP API and SMS relay
//!
//! ## Example
//!
//! ```
//! use crop_forecast_workspace::service::{providers::RandomPriceProvider, ForecastService};
//! use std::sync::Arc;
//!
//! let service = ForecastService::new(Arc::new(RandomPriceProvider::new().with_seed(3))).unwrap();
//! let forecast = service.forecast("onion").unwrap();
//! assert_eq!(forecast.values().len(), 7);
//! ```

pub use forecast_server as server;
pub use forecast_service as service;
pub use price_math as math;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_service_reexport_forecasts_seven_days() {
        let provider = Arc::new(service::providers::RandomPriceProvider::new().with_seed(11));
        let forecaster = service::ForecastService::new(provider).unwrap();

        let result = forecaster.forecast("Wheat").unwrap();
        assert_eq!(result.values().len(), service::service::FORECAST_HORIZON);
        assert!(result.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_math_reexport() {
        assert_eq!(math::differencing::difference(&[1.0, 3.0, 6.0], 1).unwrap(), vec![2.0, 3.0]);
    }
}
