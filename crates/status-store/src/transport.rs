//! Transport seam between the store and the relay.

use async_trait::async_trait;
use autopilot_core::{ControlAction, RiskConfigUpdate};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a transport implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The relay answered with a non-success status; the message is the
    /// relay's error envelope when one was present.
    #[error("relay returned {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// The relay is unreachable or the request failed mid-flight.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("unexpected relay response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type alias for transport operations.
pub type TransportResult = Result<Value, TransportError>;

/// The three operator-facing calls the store can make.
///
/// Responses are loose JSON; the store reconciles them over the default
/// snapshot itself.
#[async_trait]
pub trait StatusTransport: Send + Sync {
    async fn fetch_status(&self) -> TransportResult;

    async fn send_control(&self, action: ControlAction) -> TransportResult;

    async fn update_risk_config(&self, update: RiskConfigUpdate) -> TransportResult;
}

/// HTTP transport speaking to the relay's `/api` endpoints.
pub struct RelayTransport {
    base_url: String,
    http: reqwest::Client,
}

impl RelayTransport {
    /// Creates a transport for the relay at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn decode(response: reqwest::Response) -> TransportResult {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()));
        }

        // Prefer the relay's error envelope over raw body text.
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|value| {
                value
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or(text);

        Err(TransportError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl StatusTransport for RelayTransport {
    async fn fetch_status(&self) -> TransportResult {
        let url = format!("{}/api/status", self.base_url);
        let response = self.http.get(&url).send().await?;
        Self::decode(response).await
    }

    async fn send_control(&self, action: ControlAction) -> TransportResult {
        let url = format!("{}/api/control", self.base_url);
        let body = serde_json::json!({ "action": action.as_str() });
        let response = self.http.post(&url).json(&body).send().await?;
        Self::decode(response).await
    }

    async fn update_risk_config(&self, update: RiskConfigUpdate) -> TransportResult {
        let url = format!("{}/api/config", self.base_url);
        let response = self.http.post(&url).json(&update).send().await?;
        Self::decode(response).await
    }
}
