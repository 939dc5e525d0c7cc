//! # forecast-server
//!
//! REST API for crop price forecasts, plus an SMS relay for market
//! notifications.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use forecast_service::ForecastService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod messaging;
pub mod routes;

use config::ConfigError;
use messaging::SmsSender;

const DEFAULT_COUNTRY_CODE: &str = "+91";

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    forecast: Arc<ForecastService>,
    sms: Option<Arc<dyn SmsSender>>,
    country_code: String,
}

impl AppState {
    /// State with forecasting only; the SMS route answers 503
    pub fn new(forecast: Arc<ForecastService>) -> Self {
        Self {
            forecast,
            sms: None,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }

    /// Enable the SMS relay
    pub fn with_sms(mut self, sender: Arc<dyn SmsSender>) -> Self {
        self.sms = Some(sender);
        self
    }

    /// Prefix for phone numbers submitted without a country code
    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self
    }
}

/// CORS policy: any origin, or exactly `origin` when given
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, ConfigError> {
    match origin {
        None => Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)),
        Some(origin) => {
            let value = origin
                .parse::<HeaderValue>()
                .map_err(|e| ConfigError::InvalidValue {
                    name: "CORS_ORIGIN".to_string(),
                    reason: e.to_string(),
                })?;
            Ok(CorsLayer::new()
                .allow_origin(value)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE]))
        }
    }
}

/// Build the router with all routes and middleware
pub fn build_router(state: AppState, cors_origin: Option<&str>) -> Result<Router, ConfigError> {
    Ok(Router::new()
        .route("/health", get(routes::health))
        .route("/predict", post(routes::predict))
        .route("/api/v1/predict", post(routes::predict_detailed))
        .route("/api/sms", post(routes::send_sms))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin)?)
        .with_state(state))
}
