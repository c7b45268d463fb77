//! Error types for agent communication.
//!
//! Everything the relay needs to surface to an operator maps onto one of
//! these variants; validation of operator input happens before this crate is
//! reached and has no variant here.

use thiserror::Error;

/// Errors that can occur when talking to the agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent is unreachable or the connection failed mid-flight.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// The agent answered with a non-success HTTP status.
    #[error("agent returned {status_code}: {message}")]
    Upstream {
        /// HTTP status code.
        status_code: u16,
        /// Response body text, if any.
        message: String,
    },

    /// The response body does not match the expected shape.
    #[error("unexpected agent response: {0}")]
    Decode(String),

    /// Client construction failed.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AgentError {
    /// Creates an upstream error from status code and body text.
    pub fn upstream(status_code: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status_code,
            message: message.into(),
        }
    }

    /// Returns true if a later attempt could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Upstream { status_code, .. } => *status_code >= 500,
            Self::Decode(_) | Self::Configuration(_) => false,
        }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
