//! The crop price forecast service
//!
//! Fetches a short price history from a [`PriceProvider`], fits a fixed
//! ARIMA(2,1,2) model and forecasts the next week.

use crate::error::{ForecastError, Result};
use crate::models::arima::Arima;
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::providers::PriceProvider;
use crate::utils::future_dates;
use std::sync::Arc;

/// Days of history the model is fitted on
pub const HISTORY_DAYS: usize = 30;

/// Days forecast per request
pub const FORECAST_HORIZON: usize = 7;

/// Fixed ARIMA order `(p, d, q)`
pub const ARIMA_ORDER: (usize, usize, usize) = (2, 1, 2);

/// Tunables for a [`ForecastService`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSettings {
    /// Days of history requested from the provider
    pub history_days: usize,
    /// Days to forecast
    pub horizon: usize,
    /// Coverage of the reported intervals
    pub confidence: f64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            history_days: HISTORY_DAYS,
            horizon: FORECAST_HORIZON,
            confidence: 0.95,
        }
    }
}

impl ForecastSettings {
    fn validate(&self) -> Result<()> {
        if self.history_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "History must cover at least one day".to_string(),
            ));
        }
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be at least one day".to_string(),
            ));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Confidence must be between 0 and 1, got {}",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Produces short-horizon price forecasts for crops
#[derive(Debug, Clone)]
pub struct ForecastService {
    provider: Arc<dyn PriceProvider>,
    model: Arima,
    settings: ForecastSettings,
}

impl ForecastService {
    /// Create a service with default settings
    pub fn new(provider: Arc<dyn PriceProvider>) -> Result<Self> {
        Self::with_settings(provider, ForecastSettings::default())
    }

    /// Create a service with custom settings
    pub fn with_settings(provider: Arc<dyn PriceProvider>, settings: ForecastSettings) -> Result<Self> {
        settings.validate()?;
        let (p, d, q) = ARIMA_ORDER;

        Ok(Self {
            provider,
            model: Arima::new(p, d, q)?,
            settings,
        })
    }

    /// Forecast the next `horizon` daily prices for `crop`
    pub fn forecast(&self, crop: &str) -> Result<ForecastResult> {
        let history = self.provider.history(crop, self.settings.history_days)?;
        tracing::debug!(
            crop,
            provider = self.provider.name(),
            observations = history.len(),
            "fetched price history"
        );

        let trained = self.model.train(&history)?;
        let mut result =
            trained.forecast_with_confidence(self.settings.horizon, self.settings.confidence)?;

        if let Some(last) = history.last_date() {
            result = result.with_dates(future_dates(last, self.settings.horizon)?)?;
        }

        Ok(result.with_crop(crop))
    }

    /// Name of the price provider in use
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Name of the forecasting model
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Active settings
    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }
}
