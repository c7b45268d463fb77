use clap::{Parser, Subcommand};

mod commands;
mod tui_watch;

#[derive(Parser)]
#[command(name = "autopilot")]
#[command(about = "Supervisory console for the FX autopilot trading agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the operator-facing relay server
    Server {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Interactive dashboard watching the agent through a relay
    Watch {
        /// Relay base URL
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        relay_url: String,
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Poll interval in seconds (overrides the config file)
        #[arg(long)]
        poll_interval: Option<u64>,
    },
    /// Print a one-shot status snapshot and exit
    Status {
        /// Relay base URL
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        relay_url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // No logging for the TUI: it would corrupt the alternate screen.
    if !matches!(cli.command, Commands::Watch { .. }) {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    match cli.command {
        Commands::Server { config } => commands::run_server(&config).await,
        Commands::Watch {
            relay_url,
            config,
            poll_interval,
        } => {
            let app_config = autopilot_core::ConfigLoader::load_from(&config)?;
            let interval = poll_interval.unwrap_or(app_config.store.poll_interval_secs);
            tui_watch::run(&relay_url, interval).await
        }
        Commands::Status { relay_url } => commands::print_status(&relay_url).await,
    }
}
