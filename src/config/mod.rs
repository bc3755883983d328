//! # Configuration
//!
//! Typed configuration for the orchestration core. Every section has serde
//! defaults, so an empty (or missing) configuration file yields a working
//! setup; files and `NFVO__*` environment variables only override values.
//!
//! See [`loader::ConfigLoader`] for source discovery and layering.

pub mod loader;

pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A configuration source could not be read or parsed
    #[error("Failed to load configuration from {source_name}: {error}")]
    LoadError { source_name: String, error: String },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },
}

impl ConfigurationError {
    pub fn load_error<S: Into<String>, E: std::fmt::Display>(source_name: S, error: E) -> Self {
        Self::LoadError {
            source_name: source_name.into(),
            error: error.to_string(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value<F: Into<String>, V: Into<String>, C: Into<String>>(
        field: F,
        value: V,
        context: C,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            context: context.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(error: config::ConfigError) -> Self {
        Self::load_error("configuration sources", error)
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NfvoConfig {
    pub orchestration: OrchestrationConfig,
    pub broker: BrokerConfig,
    pub monitoring: MonitoringConfig,
    pub ems: EmsConfig,
    pub events: EventsConfig,
    pub timezone: String,
}

impl Default for NfvoConfig {
    fn default() -> Self {
        Self {
            orchestration: OrchestrationConfig::default(),
            broker: BrokerConfig::default(),
            monitoring: MonitoringConfig::default(),
            ems: EmsConfig::default(),
            events: EventsConfig::default(),
            timezone: "CET".to_string(),
        }
    }
}

impl NfvoConfig {
    /// Validate cross-field constraints
    pub fn validate(&self) -> ConfigResult<()> {
        let executor = &self.orchestration.executor;

        if executor.core_pool_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "orchestration.executor.core_pool_size",
                executor.core_pool_size.to_string(),
                "at least one permanent worker is required",
            ));
        }

        if executor.max_pool_size < executor.core_pool_size {
            return Err(ConfigurationError::invalid_value(
                "orchestration.executor.max_pool_size",
                executor.max_pool_size.to_string(),
                format!(
                    "must be greater than or equal to core_pool_size ({})",
                    executor.core_pool_size
                ),
            ));
        }

        if executor.queue_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "orchestration.executor.queue_capacity",
                "0",
                "the task queue must hold at least one task",
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                "0",
                "the event channel must hold at least one event",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Deploy functions in dependency order instead of all at once
    pub ordered: bool,
    /// Verify launched instances against what was requested
    pub check_integrity: bool,
    pub executor: ExecutorConfig,
}

/// Worker pool sizing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutorConfig {
    pub core_pool_size: usize,
    pub max_pool_size: usize,
    pub queue_capacity: usize,
    pub keep_alive_seconds: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            core_pool_size: 5,
            max_pool_size: 30,
            queue_capacity: 100,
            keep_alive_seconds: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
    pub ip: String,
    pub username: String,
    pub password: String,
    pub exchange: String,
    pub durable: bool,
    pub autodelete: bool,
    pub exclusive: bool,
    pub min_concurrency: usize,
    pub max_concurrency: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            username: "admin".to_string(),
            password: "openbaton".to_string(),
            exchange: crate::constants::DEFAULT_EXCHANGE.to_string(),
            durable: true,
            autodelete: true,
            exclusive: false,
            min_concurrency: 5,
            max_concurrency: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct MonitoringConfig {
    pub ip: String,
}

/// Settings handed to the element management agents inside instances
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmsConfig {
    pub version: String,
    pub heartbeat: String,
    pub autodelete: String,
}

impl Default for EmsConfig {
    fn default() -> Self {
        Self {
            version: "0.15".to_string(),
            heartbeat: "60".to_string(),
            autodelete: "true".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1000,
        }
    }
}
