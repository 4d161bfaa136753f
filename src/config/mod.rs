use std::time::Duration;
use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod loader;

pub use catalog::{OperatorCatalog, OperatorCatalogEntry, TrafficKind};
pub use loader::AppConfig;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub push_interval_secs: u64,
    pub league_push_interval_secs: u64,
}

impl ServerConfig {
    pub fn push_interval(&self) -> Duration {
        Duration::from_secs(self.push_interval_secs)
    }

    pub fn league_push_interval(&self) -> Duration {
        Duration::from_secs(self.league_push_interval_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0:8080".to_string(),
            push_interval_secs: 15,
            league_push_interval_secs: 5,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub channel_capacity: usize,
    pub reconnect_delay_secs: u64,
}

impl FeedConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            url: "ws://127.0.0.1:9090/rtppm".to_string(),
            channel_capacity: 64,
            reconnect_delay_secs: 5,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub domain_channel_capacity: usize,
    pub watchdog_secs: u64,
    pub min_sample: u64,
    pub shutdown_grace_secs: u64,
}

impl PipelineConfig {
    pub fn watchdog(&self) -> Duration {
        Duration::from_secs(self.watchdog_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            domain_channel_capacity: 10,
            watchdog_secs: 300,  // 5 minutes
            min_sample: 10,
            shutdown_grace_secs: 30,
        }
    }
}

/// Without a URL the league table lives in process memory.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}
