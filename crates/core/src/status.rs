//! Agent status snapshot and reconciliation.
//!
//! The agent reports its state as loosely-shaped JSON. Everything the
//! console displays is a [`BotStatus`] produced by merging that JSON over a
//! complete default snapshot, so downstream code never sees a partial or
//! mistyped value.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Trade direction attached to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

/// A single trade signal emitted by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    /// Model confidence in [0, 1].
    pub confidence: f64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Complete snapshot of agent state.
///
/// Snapshots are immutable values: the store replaces the whole snapshot on
/// every applied response and never patches sequences incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotStatus {
    /// Whether the agent's trading loop is active.
    pub running: bool,
    /// Last confirmed liveness; `None` means never observed.
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub active_symbol: Option<String>,
    pub open_positions: u32,
    pub account_balance: Decimal,
    pub account_equity: Decimal,
    #[serde(rename = "todayPnL")]
    pub today_pnl: Decimal,
    /// Fraction of equity risked per trade, echoed back by the agent.
    pub risk_per_trade: f64,
    pub max_concurrent_trades: u32,
    /// Fractional daily loss threshold, echoed back by the agent.
    pub max_daily_drawdown: f64,
    /// Most-recent-first; the agent bounds the length, the console does not
    /// re-sort or truncate.
    pub recent_signals: Vec<Signal>,
    /// Free-text advisories in append order.
    pub notes: Vec<String>,
}

impl Default for BotStatus {
    fn default() -> Self {
        Self {
            running: false,
            last_heartbeat: None,
            active_symbol: None,
            open_positions: 0,
            account_balance: Decimal::ZERO,
            account_equity: Decimal::ZERO,
            today_pnl: Decimal::ZERO,
            risk_per_trade: 0.01,
            max_concurrent_trades: 3,
            max_daily_drawdown: 0.03,
            recent_signals: Vec::new(),
            notes: Vec::new(),
        }
    }
}

impl BotStatus {
    /// Reconciles a loosely-shaped agent response over the default snapshot.
    ///
    /// Recognized fields with the expected JSON type overwrite the default;
    /// absent or mistyped fields keep it. Signal entries are decoded
    /// individually and malformed ones skipped, so one bad entry cannot drop
    /// an entire feed. A non-object input yields the default snapshot.
    #[must_use]
    pub fn from_partial(value: &Value) -> Self {
        let mut status = Self::default();
        let Some(obj) = value.as_object() else {
            return status;
        };

        if let Some(running) = obj.get("running").and_then(Value::as_bool) {
            status.running = running;
        }
        if let Some(ts) = obj.get("lastHeartbeat").and_then(Value::as_str) {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(ts) {
                status.last_heartbeat = Some(parsed.with_timezone(&Utc));
            }
        }
        if let Some(symbol) = obj.get("activeSymbol").and_then(Value::as_str) {
            status.active_symbol = Some(symbol.to_string());
        }
        if let Some(count) = obj.get("openPositions").and_then(Value::as_u64) {
            status.open_positions = u32::try_from(count).unwrap_or(u32::MAX);
        }
        if let Some(balance) = obj.get("accountBalance").and_then(as_decimal) {
            status.account_balance = balance;
        }
        if let Some(equity) = obj.get("accountEquity").and_then(as_decimal) {
            status.account_equity = equity;
        }
        if let Some(pnl) = obj.get("todayPnL").and_then(as_decimal) {
            status.today_pnl = pnl;
        }
        if let Some(risk) = obj.get("riskPerTrade").and_then(Value::as_f64) {
            status.risk_per_trade = risk;
        }
        if let Some(max) = obj.get("maxConcurrentTrades").and_then(Value::as_u64) {
            status.max_concurrent_trades = u32::try_from(max).unwrap_or(u32::MAX);
        }
        if let Some(drawdown) = obj.get("maxDailyDrawdown").and_then(Value::as_f64) {
            status.max_daily_drawdown = drawdown;
        }
        if let Some(signals) = obj.get("recentSignals").and_then(Value::as_array) {
            status.recent_signals = signals
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect();
        }
        if let Some(notes) = obj.get("notes").and_then(Value::as_array) {
            status.notes = notes
                .iter()
                .filter_map(|entry| entry.as_str().map(str::to_string))
                .collect();
        }

        status
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    value.as_f64().and_then(|v| Decimal::try_from(v).ok())
}

/// Heartbeat freshness derived from the snapshot and the current time.
///
/// Pure function of its inputs, recomputed on every read and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatFreshness {
    /// Last heartbeat is less than 60 seconds old.
    Live,
    /// Elapsed whole minutes since the last heartbeat.
    MinutesAgo(i64),
    /// No heartbeat has ever been observed.
    Never,
}

impl HeartbeatFreshness {
    /// Classifies a heartbeat timestamp against `now`.
    ///
    /// A timestamp ahead of `now` (clock skew) counts as live.
    #[must_use]
    pub fn classify(last_heartbeat: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match last_heartbeat {
            None => Self::Never,
            Some(ts) => {
                let elapsed_secs = now.signed_duration_since(ts).num_seconds();
                if elapsed_secs < 60 {
                    Self::Live
                } else {
                    Self::MinutesAgo(elapsed_secs / 60)
                }
            }
        }
    }
}

impl std::fmt::Display for HeartbeatFreshness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "Live"),
            Self::MinutesAgo(minutes) => write!(f, "{minutes}m ago"),
            Self::Never => write!(f, "No heartbeat yet"),
        }
    }
}
