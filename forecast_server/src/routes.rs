//! API route handlers

use crate::error::ApiError;
use crate::messaging::{mask_phone, normalize_phone};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use forecast_service::ForecastResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub crop: String,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predicted_prices: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct DetailedPredictResponse {
    pub crop: String,
    pub predicted_prices: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<Vec<NaiveDate>>,
    pub model: String,
    pub provider: String,
}

#[derive(Debug, Deserialize)]
pub struct SmsRequest {
    #[serde(rename = "phoneNumber", alias = "phone")]
    pub phone_number: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SmsResponse {
    pub success: bool,
    pub message: String,
    pub sid: String,
}

/// Liveness probe
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Fit and forecast off the async runtime
async fn run_forecast(state: &AppState, crop: String) -> Result<ForecastResult, ApiError> {
    let crop = crop.trim().to_string();
    if crop.is_empty() {
        return Err(ApiError::BadRequest("crop must not be empty".to_string()));
    }

    let service = state.forecast.clone();
    let result = tokio::task::spawn_blocking(move || service.forecast(&crop))
        .await
        .map_err(|e| ApiError::Internal(format!("forecast task failed: {}", e)))??;

    Ok(result)
}

/// `POST /predict`
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(req) = payload?;
    let result = run_forecast(&state, req.crop).await?;

    tracing::info!(
        crop = result.crop().unwrap_or_default(),
        horizon = result.horizons(),
        "forecast served"
    );

    Ok(Json(PredictResponse {
        predicted_prices: result.into_values(),
    }))
}

/// `POST /api/v1/predict`, the forecast with intervals and dates
pub async fn predict_detailed(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<DetailedPredictResponse>, ApiError> {
    let Json(req) = payload?;
    let result = run_forecast(&state, req.crop).await?;

    let (lower, upper): (Vec<f64>, Vec<f64>) = result
        .intervals()
        .map(|intervals| intervals.iter().cloned().unzip())
        .unwrap_or_default();

    Ok(Json(DetailedPredictResponse {
        crop: result.crop().unwrap_or_default().to_string(),
        predicted_prices: result.values().to_vec(),
        lower,
        upper,
        dates: result.dates().map(|d| d.to_vec()),
        model: state.forecast.model_name().to_string(),
        provider: state.forecast.provider_name().to_string(),
    }))
}

/// `POST /api/sms`
pub async fn send_sms(
    State(state): State<AppState>,
    payload: Result<Json<SmsRequest>, JsonRejection>,
) -> Result<Json<SmsResponse>, ApiError> {
    let Json(req) = payload?;

    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (phone, message) = match (non_blank(req.phone_number), non_blank(req.message)) {
        (Some(phone), Some(message)) => (phone, message),
        _ => {
            return Err(ApiError::BadRequest(
                "Phone number and message are required.".to_string(),
            ))
        }
    };

    let to = normalize_phone(&phone, &state.country_code)?;
    let sender = state.sms.clone().ok_or(ApiError::MessagingUnavailable)?;

    let receipt = sender.send(&to, &message).await?;
    tracing::info!(
        to = %mask_phone(&to),
        provider = sender.name(),
        sid = %receipt.sid,
        "SMS sent"
    );

    Ok(Json(SmsResponse {
        success: true,
        message: "SMS sent successfully".to_string(),
        sid: receipt.sid,
    }))
}
