use anyhow::Result;
use autopilot_agent_client::{AgentClient, AgentClientConfig};
use autopilot_core::{BotStatus, ConfigLoader, HeartbeatFreshness};
use autopilot_relay::RelayServer;
use autopilot_status_store::{RelayTransport, StatusTransport};
use chrono::Utc;
use std::sync::Arc;

/// Loads configuration and serves the relay until interrupted.
pub async fn run_server(config_path: &str) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;

    let agent = AgentClient::new(AgentClientConfig::from(&config.agent))?;
    if agent.is_mock() {
        tracing::warn!("no agent base URL configured; serving synthetic status data");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    RelayServer::new(Arc::new(agent)).serve(&addr).await
}

/// Fetches one snapshot through the relay and prints a plain summary.
pub async fn print_status(relay_url: &str) -> Result<()> {
    let transport = RelayTransport::new(relay_url)?;
    let body = transport.fetch_status().await?;
    let status = BotStatus::from_partial(&body);

    let freshness = HeartbeatFreshness::classify(status.last_heartbeat, Utc::now());

    println!("Running:        {}", if status.running { "yes" } else { "no" });
    println!("Heartbeat:      {freshness}");
    println!(
        "Active symbol:  {}",
        status.active_symbol.as_deref().unwrap_or("-")
    );
    println!("Open positions: {}", status.open_positions);
    println!("Balance:        {}", status.account_balance);
    println!("Equity:         {}", status.account_equity);
    println!("Today PnL:      {}", status.today_pnl);
    println!(
        "Risk limits:    {:.2}% per trade, {} concurrent, {:.2}% daily drawdown",
        status.risk_per_trade * 100.0,
        status.max_concurrent_trades,
        status.max_daily_drawdown * 100.0
    );

    for signal in &status.recent_signals {
        println!(
            "signal: {:?} {} ({:.0}%) - {}",
            signal.direction,
            signal.symbol,
            signal.confidence * 100.0,
            signal.reason
        );
    }
    for note in &status.notes {
        println!("note: {note}");
    }

    Ok(())
}
