//! Operator command payloads sent toward the agent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Control verbs accepted by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Start,
    Stop,
    Refresh,
}

impl ControlAction {
    /// The exact wire literal for this action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for ControlAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when an inbound action string is not one of the three literals.
#[derive(Debug, Error)]
#[error("unknown control action: {0}")]
pub struct ParseActionError(String);

impl std::str::FromStr for ControlAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "refresh" => Ok(Self::Refresh),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}

/// Risk limits submitted to the agent.
///
/// All three fields are JSON numbers at this boundary. The relay enforces
/// type only; the agent is the authority on acceptable ranges and may reject
/// out-of-range values itself, which surfaces as an upstream error. That is
/// also why `maxConcurrentTrades` is not an integer type here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskConfigUpdate {
    pub risk_per_trade: f64,
    pub max_concurrent_trades: f64,
    pub max_daily_drawdown: f64,
}
