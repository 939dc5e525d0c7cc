//! SMS notifications through an external messaging provider
//!
//! Routes depend on the [`SmsSender`] trait only; [`TwilioSender`] talks to
//! the Twilio REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const TWILIO_API_BASE: &str = "https://api.twilio.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while sending a message
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The recipient number cannot be used
    #[error("Invalid phone number: {0}")]
    InvalidNumber(String),

    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The provider answered with an error
    #[error("Provider rejected message [{status}]: {message}")]
    Rejected { status: u16, message: String },

    /// The provider's response could not be understood
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Provider acknowledgement of an accepted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsReceipt {
    /// Provider message identifier
    pub sid: String,
    /// Delivery status reported at submission time
    pub status: Option<String>,
}

/// Something that can deliver a text message to a phone number
#[async_trait]
pub trait SmsSender: fmt::Debug + Send + Sync {
    /// Send `body` to the E.164 number `to`
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, MessagingError>;

    /// Name of the provider
    fn name(&self) -> &str;
}

/// Account credentials and sender number for Twilio
#[derive(Clone, PartialEq, Eq)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from_number", &self.from_number)
            .finish()
    }
}

/// Twilio Programmable Messaging client
#[derive(Debug, Clone)]
pub struct TwilioSender {
    client: reqwest::Client,
    base_url: String,
    credentials: TwilioCredentials,
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: String,
    code: Option<u32>,
}

impl TwilioSender {
    /// Create a client for the public Twilio API
    pub fn new(credentials: TwilioCredentials) -> Result<Self, MessagingError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MessagingError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: TWILIO_API_BASE.to_string(),
            credentials,
        })
    }

    /// Point the client at another API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Endpoint that creates messages for the configured account
    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.credentials.account_sid
        )
    }

    fn parse_error(status: u16, text: &str) -> MessagingError {
        match serde_json::from_str::<TwilioErrorBody>(text) {
            Ok(body) => MessagingError::Rejected {
                status,
                message: match body.code {
                    Some(code) => format!("{} (code {})", body.message, code),
                    None => body.message,
                },
            },
            Err(_) => MessagingError::Rejected {
                status,
                message: text.to_string(),
            },
        }
    }
}

#[async_trait]
impl SmsSender for TwilioSender {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, MessagingError> {
        let params = [
            ("To", to),
            ("From", self.credentials.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(
                &self.credentials.account_sid,
                Some(&self.credentials.auth_token),
            )
            .form(&params)
            .send()
            .await
            .map_err(|e| MessagingError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| MessagingError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::parse_error(status.as_u16(), &text));
        }

        let message: TwilioMessage =
            serde_json::from_str(&text).map_err(|e| MessagingError::ParseError(e.to_string()))?;

        Ok(SmsReceipt {
            sid: message.sid,
            status: message.status,
        })
    }

    fn name(&self) -> &str {
        "twilio"
    }
}

/// Bring a user-entered phone number into E.164 form.
///
/// Spaces, dashes, dots and parentheses are dropped. Numbers without a
/// leading `+` get `default_country_code` prepended.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> Result<String, MessagingError> {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let (has_plus, digits) = match compact.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, compact.as_str()),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(MessagingError::InvalidNumber(raw.to_string()));
    }

    let number = if has_plus {
        format!("+{}", digits)
    } else {
        format!("{}{}", default_country_code, digits)
    };

    // E.164 allows at most 15 digits after the '+'
    let digit_count = number.len() - 1;
    if !(8..=15).contains(&digit_count) {
        return Err(MessagingError::InvalidNumber(raw.to_string()));
    }

    Ok(number)
}

/// Phone number with all but the last four digits hidden, for logs
pub fn mask_phone(number: &str) -> String {
    let visible = number.len().saturating_sub(4);
    number
        .chars()
        .enumerate()
        .map(|(i, c)| if i < visible && c.is_ascii_digit() { '*' } else { c })
        .collect()
}
