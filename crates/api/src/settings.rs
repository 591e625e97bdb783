//! Application configuration
//!
//! Layered from built-in defaults, an optional TOML file and
//! `SOIL_HEALTH__SECTION__KEY` environment variables.

use advisory::AdvisoryConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use storage::StorageConfig;

use crate::error::ApiError;
use crate::rate_limit::RateLimitConfig;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "SOIL_HEALTH_CONFIG";

/// Config file used when `SOIL_HEALTH_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "soil-health.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub advisory: AdvisoryConfig,
    pub rate_limit: RateLimitConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Max level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from the file named by `SOIL_HEALTH_CONFIG` (or the default path)
    pub fn load() -> Result<Self, ApiError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load from `path`; a missing file falls back to defaults
    pub fn load_from(path: &str) -> Result<Self, ApiError> {
        let config = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("SOIL_HEALTH").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from("/nonexistent/soil-health.toml").unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.storage.batch_size, 10_000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.advisory, AdvisoryConfig::default());
    }

    #[test]
    fn test_file_overrides() {
        let path = std::env::temp_dir().join(format!(
            "soil-health-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"
[server]
bind_addr = "127.0.0.1:9000"

[storage]
database_url = "sqlite::memory:"
batch_size = 500

[advisory.moisture]
low = 15.0
high = 45.0
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert!(config.storage.is_in_memory());
        assert_eq!(config.storage.batch_size, 500);
        assert_eq!(config.advisory.moisture.low, 15.0);
        assert_eq!(config.advisory.moisture.high, 45.0);
        assert_eq!(config.advisory.ph.high, 7.5);
        assert!(config.rate_limit.enabled);
    }
}
