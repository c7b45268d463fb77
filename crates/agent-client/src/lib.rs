//! HTTP client for the FX autopilot trading agent.
//!
//! This crate provides:
//! - Typed access to the agent's three control-plane endpoints
//! - Reconciliation of sparse agent responses into complete snapshots
//! - A flagged mock fallback when no agent URL is configured
//!
//! # Example
//!
//! ```ignore
//! use autopilot_agent_client::{AgentClient, AgentClientConfig};
//! use autopilot_core::ControlAction;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AgentClientConfig::default().with_base_url("http://127.0.0.1:8000");
//!     let client = AgentClient::new(config)?;
//!
//!     let status = client.send_control(ControlAction::Start).await?;
//!     println!("running = {}", status.running);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Agent Endpoints
//!
//! - `GET /status` - current snapshot
//! - `POST /control` - start, stop, or refresh the trading loop
//! - `POST /config` - persist new risk limits
//!
//! # Mock Mode
//!
//! When no base URL is configured the client performs no I/O at all and
//! synthesizes snapshots from the default shape. Every synthesized snapshot
//! carries an advisory note so the operator can tell the data is not real.

pub mod client;
pub mod error;

pub use client::{AgentClient, AgentClientConfig, MOCK_MODE_NOTE};
pub use error::{AgentError, Result};
