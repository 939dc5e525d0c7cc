//! Server configuration loaded from the environment
//!
//! Secrets such as the SMS provider credentials are only ever read from the
//! process environment (optionally populated from a `.env` file at startup).

use crate::messaging::TwilioCredentials;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_COUNTRY_CODE: &str = "+91";

/// Errors raised while reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be used
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    /// Only part of the SMS credentials were supplied
    #[error("Incomplete SMS configuration: missing {0}")]
    IncompleteMessaging(String),
}

/// Runtime configuration of the forecast server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Single allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,
    /// CSV price history feed; random placeholder prices when unset
    pub price_csv: Option<PathBuf>,
    /// Seed for the random placeholder prices
    pub price_seed: Option<u64>,
    /// SMS provider credentials; SMS relay disabled when unset
    pub twilio: Option<TwilioCredentials>,
    /// Override of the SMS provider API base URL
    pub twilio_api_base: Option<String>,
    /// Prefix for phone numbers given without one
    pub sms_default_country_code: String,
}

impl ServerConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                name: "PORT".to_string(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let price_seed = get("PRICE_SEED")
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    name: "PRICE_SEED".to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let sms_default_country_code =
            get("SMS_DEFAULT_COUNTRY_CODE").unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string());
        if !sms_default_country_code.starts_with('+')
            || !sms_default_country_code[1..].chars().all(|c| c.is_ascii_digit())
            || sms_default_country_code.len() < 2
        {
            return Err(ConfigError::InvalidValue {
                name: "SMS_DEFAULT_COUNTRY_CODE".to_string(),
                reason: "expected '+' followed by digits".to_string(),
            });
        }

        let twilio = Self::twilio_credentials(
            get("TWILIO_ACCOUNT_SID"),
            get("TWILIO_AUTH_TOKEN"),
            get("TWILIO_PHONE_NUMBER"),
        )?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            cors_origin: get("CORS_ORIGIN"),
            price_csv: get("PRICE_CSV").map(PathBuf::from),
            price_seed,
            twilio,
            twilio_api_base: get("TWILIO_API_BASE"),
            sms_default_country_code,
        })
    }

    fn twilio_credentials(
        account_sid: Option<String>,
        auth_token: Option<String>,
        from_number: Option<String>,
    ) -> Result<Option<TwilioCredentials>, ConfigError> {
        match (account_sid, auth_token, from_number) {
            (None, None, None) => Ok(None),
            (Some(account_sid), Some(auth_token), Some(from_number)) => {
                Ok(Some(TwilioCredentials {
                    account_sid,
                    auth_token,
                    from_number,
                }))
            }
            (sid, token, number) => {
                let missing: Vec<&str> = [
                    ("TWILIO_ACCOUNT_SID", sid.is_none()),
                    ("TWILIO_AUTH_TOKEN", token.is_none()),
                    ("TWILIO_PHONE_NUMBER", number.is_none()),
                ]
                .iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| *name)
                .collect();
                Err(ConfigError::IncompleteMessaging(missing.join(", ")))
            }
        }
    }

    /// Socket address to listen on
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        let ip: IpAddr = host.parse().map_err(|e: AddrParseError| ConfigError::InvalidValue {
            name: "HOST".to_string(),
            reason: e.to_string(),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
