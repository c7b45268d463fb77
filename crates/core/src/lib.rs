pub mod command;
pub mod config;
pub mod config_loader;
pub mod status;

pub use command::{ControlAction, ParseActionError, RiskConfigUpdate};
pub use config::{AgentConfig, AppConfig, ServerConfig, StoreConfig};
pub use config_loader::ConfigLoader;
pub use status::{BotStatus, Direction, HeartbeatFreshness, Signal};
