//! Agent REST client with a flagged mock fallback.
//!
//! All three control-plane calls go through one client so that error
//! classification and the mock fallback live in a single place; the relay
//! and the status store never need to know whether a real agent exists.

use crate::error::{AgentError, Result};
use autopilot_core::{AgentConfig, BotStatus, ControlAction, RiskConfigUpdate};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Advisory note attached to every snapshot synthesized in mock mode.
///
/// Silently fabricated financial data is a hazard in a trading context, so
/// mock snapshots always identify themselves.
pub const MOCK_MODE_NOTE: &str = "Mock mode: no agent configured; displaying synthetic data.";

/// Configuration for the agent client.
#[derive(Debug, Clone, Default)]
pub struct AgentClientConfig {
    /// Agent base URL; `None` selects mock mode.
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl AgentClientConfig {
    /// Sets the agent base URL, switching the client to live mode.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn timeout(&self) -> Duration {
        // A zero timeout would fail every request; treat it as the default.
        Duration::from_secs(if self.timeout_secs == 0 {
            10
        } else {
            self.timeout_secs
        })
    }
}

impl From<&AgentConfig> for AgentClientConfig {
    fn from(config: &AgentConfig) -> Self {
        Self {
            base_url: config
                .base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// Agent REST API client.
pub struct AgentClient {
    config: AgentClientConfig,
    http: Client,
}

impl std::fmt::Debug for AgentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl AgentClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: AgentClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AgentError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    /// Returns true when no agent URL is configured and responses are
    /// synthesized.
    #[must_use]
    pub fn is_mock(&self) -> bool {
        self.config.base_url.is_none()
    }

    /// Fetches the current agent snapshot.
    ///
    /// # Errors
    /// Returns an error if the agent is unreachable, answers with a
    /// non-success status, or the body is not a JSON object.
    pub async fn fetch_status(&self) -> Result<BotStatus> {
        let Some(base) = self.config.base_url.as_deref() else {
            return Ok(Self::mock_status());
        };

        let url = format!("{base}/status");
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::decode_status(response).await
    }

    /// Instructs the agent to change run state or force a refresh, and
    /// returns the resulting snapshot.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success response.
    pub async fn send_control(&self, action: ControlAction) -> Result<BotStatus> {
        let Some(base) = self.config.base_url.as_deref() else {
            return Ok(Self::mock_control(action));
        };

        let url = format!("{base}/control");
        tracing::debug!("POST {} action={}", url, action);

        let body = serde_json::json!({ "action": action.as_str() });
        let response = self.http.post(&url).json(&body).send().await?;

        Self::decode_status(response).await
    }

    /// Persists new risk limits on the agent and returns the snapshot
    /// reflecting the applied (possibly agent-clamped) values.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success response,
    /// including the agent rejecting out-of-range values.
    pub async fn update_risk_config(&self, update: RiskConfigUpdate) -> Result<BotStatus> {
        let Some(base) = self.config.base_url.as_deref() else {
            return Ok(Self::mock_risk_config(update));
        };

        let url = format!("{base}/config");
        tracing::debug!("POST {}", url);

        let response = self.http.post(&url).json(&update).send().await?;

        Self::decode_status(response).await
    }

    /// Handles an agent response, reconciling the body over the default
    /// snapshot so a sparse answer still yields a complete value.
    async fn decode_status(response: reqwest::Response) -> Result<BotStatus> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::upstream(status.as_u16(), text));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AgentError::Decode(e.to_string()))?;

        if !body.is_object() {
            return Err(AgentError::Decode("expected a JSON object".to_string()));
        }

        Ok(BotStatus::from_partial(&body))
    }

    // =========================================================================
    // Mock Mode
    // =========================================================================

    fn mock_status() -> BotStatus {
        let mut status = BotStatus::default();
        status.notes.push(MOCK_MODE_NOTE.to_string());
        status
    }

    fn mock_control(action: ControlAction) -> BotStatus {
        let mut status = Self::mock_status();
        match action {
            ControlAction::Start => status.running = true,
            ControlAction::Stop => status.running = false,
            ControlAction::Refresh => {}
        }
        status
    }

    fn mock_risk_config(update: RiskConfigUpdate) -> BotStatus {
        let mut status = Self::mock_status();
        status.risk_per_trade = update.risk_per_trade;
        status.max_concurrent_trades = update.max_concurrent_trades.max(0.0) as u32;
        status.max_daily_drawdown = update.max_daily_drawdown;
        status
    }
}
