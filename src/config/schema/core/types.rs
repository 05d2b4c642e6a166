use super::super::{GatewayConfig, GenerationConfig, SessionConfig};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - resolved at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Tracing max level: error, warn, info, debug or trace
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub generation: GenerationConfig,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            log_level: default_log_level(),
            gateway: GatewayConfig::default(),
            session: SessionConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Config {
    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.max_length == 0 {
            return Err(ConfigError::Validation(
                "generation.max_length must be greater than 0".into(),
            ));
        }
        if self.generation.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "generation.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.generation.max_concurrent == 0 {
            return Err(ConfigError::Validation(
                "generation.max_concurrent must be greater than 0".into(),
            ));
        }
        if self.gateway.request_timeout_secs <= self.generation.timeout_secs {
            return Err(ConfigError::Validation(format!(
                "gateway.request_timeout_secs ({}) must exceed generation.timeout_secs ({})",
                self.gateway.request_timeout_secs, self.generation.timeout_secs
            )));
        }
        if self.session.max_sessions == 0 {
            return Err(ConfigError::Validation(
                "session.max_sessions must be greater than 0".into(),
            ));
        }
        if self.session.idle_ttl_secs == 0 || self.session.sweep_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "session.idle_ttl_secs and session.sweep_interval_secs must be greater than 0"
                    .into(),
            ));
        }
        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Validation(format!(
                "unknown log_level '{}'",
                self.log_level
            )));
        }
        Ok(())
    }
}
