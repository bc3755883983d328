//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are layered, later ones
//! overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. `<dir>/nfvo.yaml` (optional)
//! 3. `<dir>/nfvo.<environment>.yaml` (optional)
//! 4. `NFVO__SECTION__KEY` environment variables

use super::{ConfigResult, ConfigurationError, NfvoConfig};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BASE_FILE_STEM: &str = "nfvo";
const ENV_PREFIX: &str = "NFVO";
const ENV_SEPARATOR: &str = "__";

/// Loads [`NfvoConfig`] from files and the process environment
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_directory: PathBuf,
    environment: String,
    use_process_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(PathBuf::from("config"), Self::detect_environment())
    }
}

impl ConfigLoader {
    pub fn new(config_directory: impl Into<PathBuf>, environment: impl Into<String>) -> Self {
        Self {
            config_directory: config_directory.into(),
            environment: environment.into(),
            use_process_env: true,
        }
    }

    /// Ignore `NFVO__*` variables; useful in tests that must not see the host env
    pub fn without_process_env(mut self) -> Self {
        self.use_process_env = false;
        self
    }

    /// Load configuration with environment auto-detection from `./config`
    pub fn load() -> ConfigResult<NfvoConfig> {
        Self::default().load_config()
    }

    /// Detect the current environment
    pub fn detect_environment() -> String {
        std::env::var("NFVO_ENV")
            .or_else(|_| std::env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Build, deserialize and validate the layered configuration
    pub fn load_config(&self) -> ConfigResult<NfvoConfig> {
        let base_path = self.config_directory.join(format!("{BASE_FILE_STEM}.yaml"));
        let env_path = self
            .config_directory
            .join(format!("{BASE_FILE_STEM}.{}.yaml", self.environment));

        debug!(
            environment = %self.environment,
            base = %base_path.display(),
            overrides = %env_path.display(),
            "🔧 CONFIG: Loading configuration"
        );

        let defaults = Config::try_from(&NfvoConfig::default())
            .map_err(|e| ConfigurationError::load_error("defaults", e))?;

        let mut builder = Config::builder()
            .add_source(defaults)
            .add_source(File::from(base_path.as_path()).required(false))
            .add_source(File::from(env_path.as_path()).required(false));

        if self.use_process_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            );
        }

        let config: NfvoConfig = builder
            .build()
            .map_err(|e| ConfigurationError::load_error(self.config_directory.display().to_string(), e))?
            .try_deserialize()?;

        config.validate()?;

        info!(
            environment = %self.environment,
            ordered = config.orchestration.ordered,
            core_pool_size = config.orchestration.executor.core_pool_size,
            max_pool_size = config.orchestration.executor.max_pool_size,
            broker_ip = %config.broker.ip,
            "✅ CONFIG: Configuration loaded"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(dir.path().join("absent"), "test").without_process_env();

        let config = loader.load_config().unwrap();
        assert_eq!(config, NfvoConfig::default());
    }

    #[test]
    fn test_environment_file_overrides_base() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("nfvo.yaml"),
            "orchestration:\n  ordered: true\n  executor:\n    core_pool_size: 2\n    max_pool_size: 4\nbroker:\n  ip: 10.0.0.1\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("nfvo.test.yaml"),
            "broker:\n  ip: 10.0.0.2\ntimezone: UTC\n",
        )
        .unwrap();

        let config = ConfigLoader::new(dir.path(), "test")
            .without_process_env()
            .load_config()
            .unwrap();

        assert!(config.orchestration.ordered);
        assert_eq!(config.orchestration.executor.core_pool_size, 2);
        assert_eq!(config.orchestration.executor.max_pool_size, 4);
        assert_eq!(config.orchestration.executor.queue_capacity, 100);
        assert_eq!(config.broker.ip, "10.0.0.2");
        assert_eq!(config.broker.username, "admin");
        assert_eq!(config.timezone, "UTC");
    }

    #[test]
    fn test_invalid_file_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("nfvo.yaml"),
            "orchestration:\n  executor:\n    core_pool_size: 8\n    max_pool_size: 3\n",
        )
        .unwrap();

        let error = ConfigLoader::new(dir.path(), "test")
            .without_process_env()
            .load_config()
            .unwrap_err();
        assert!(matches!(error, ConfigurationError::InvalidValue { .. }));
    }
}
