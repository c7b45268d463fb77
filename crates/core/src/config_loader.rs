use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration from the default location, merging
    /// TOML and `AUTOPILOT_`-prefixed environment variables over built-in
    /// defaults. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed or a
    /// value has the wrong shape.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Loads application configuration from a specific TOML file.
    ///
    /// Environment variables use `__` as the section separator, e.g.
    /// `AUTOPILOT_AGENT__BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed or a
    /// value has the wrong shape.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("AUTOPILOT_").split("__"))
            .extract()?;

        Ok(config)
    }
}
