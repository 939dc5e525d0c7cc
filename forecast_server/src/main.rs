//! Crop price forecast server binary

use forecast_server::config::ServerConfig;
use forecast_server::messaging::TwilioSender;
use forecast_server::{build_router, AppState};
use forecast_service::providers::{CsvPriceProvider, PriceProvider, RandomPriceProvider};
use forecast_service::ForecastService;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (optional - won't fail if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "forecast_server=info,forecast_service=info,tower_http=info".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let provider: Arc<dyn PriceProvider> = match &config.price_csv {
        Some(path) => {
            let feed = CsvPriceProvider::from_path(path)?;
            tracing::info!(path = %path.display(), crops = feed.crops().len(), "loaded price history feed");
            Arc::new(feed)
        }
        None => {
            tracing::warn!("PRICE_CSV not set; forecasting on random placeholder prices");
            let random = RandomPriceProvider::new();
            Arc::new(match config.price_seed {
                Some(seed) => random.with_seed(seed),
                None => random,
            })
        }
    };

    let forecast = Arc::new(ForecastService::new(provider)?);
    let settings = forecast.settings();
    tracing::info!(
        model = forecast.model_name(),
        provider = forecast.provider_name(),
        history_days = settings.history_days,
        horizon = settings.horizon,
        "forecast_service v{} ready",
        forecast_service::VERSION
    );
    let mut state =
        AppState::new(forecast).with_country_code(config.sms_default_country_code.clone());

    match config.twilio.clone() {
        Some(credentials) => {
            let mut sender = TwilioSender::new(credentials)?;
            if let Some(base) = &config.twilio_api_base {
                sender = sender.with_base_url(base.as_str());
            }
            tracing::info!("SMS relay enabled");
            state = state.with_sms(Arc::new(sender));
        }
        None => tracing::warn!("Twilio credentials not configured; SMS relay disabled"),
    }

    let app = build_router(state, config.cors_origin.as_deref())?;
    let addr = config.bind_address()?;

    tracing::info!(
        "forecast-server v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
