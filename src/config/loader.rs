use crate::config::catalog::{OperatorCatalog, OperatorCatalogEntry};
use crate::config::*;
use crate::error::{Error, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub pipeline: PipelineConfig,
    pub redis: RedisConfig,
    pub logging: LoggingConfig,
    pub operators: Vec<OperatorCatalogEntry>,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("TRAINSTATS").separator("__"))
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Intervals and channel capacities must be non-zero.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("server.push_interval_secs", self.server.push_interval_secs),
            ("server.league_push_interval_secs", self.server.league_push_interval_secs),
            ("feed.channel_capacity", self.feed.channel_capacity as u64),
            ("feed.reconnect_delay_secs", self.feed.reconnect_delay_secs),
            ("pipeline.domain_channel_capacity", self.pipeline.domain_channel_capacity as u64),
            ("pipeline.watchdog_secs", self.pipeline.watchdog_secs),
        ];

        for (key, value) in checks {
            if value == 0 {
                return Err(Error::ConfigError(format!("{} must be greater than zero", key)));
            }
        }
        Ok(())
    }

    pub fn catalog(&self) -> OperatorCatalog {
        OperatorCatalog::new(self.operators.clone())
    }
}
