//! Configuration management module.
//!
//! Supports loading configuration from:
//! - TOML files (config/default.toml, config/{profile}.toml)
//! - Environment variables with `IDISSUER__<SECTION>__<KEY>` pattern

mod client;
mod server;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::service::{DEFAULT_MAX_ATTEMPTS, RetryLimit};

pub use client::ClientConfig;
pub use server::ServerConfig;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// WebSocket server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Issuance configuration.
    #[serde(default)]
    pub issuance: IssuanceConfig,

    /// Dialer configuration.
    #[serde(default)]
    pub client: ClientConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. `config/default.toml`
    /// 2. `config/{IDISSUER_PROFILE}.toml` (if `IDISSUER_PROFILE` is set)
    /// 3. Environment variables with `IDISSUER__` prefix
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let profile =
            std::env::var("IDISSUER_PROFILE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{profile}")).required(false))
            // IDISSUER__SERVER__PORT=8080 -> server.port = 8080
            .add_source(
                Environment::with_prefix("IDISSUER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("server.port cannot be 0".to_string()));
        }

        self.client.validate()?;

        Ok(())
    }
}

/// Issuance configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuanceConfig {
    /// Maximum draws per issued identifier (0 = unbounded).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl IssuanceConfig {
    /// Retry budget for the issuance service.
    #[must_use]
    pub fn retry_limit(&self) -> RetryLimit {
        RetryLimit::from_max_attempts(self.max_attempts)
    }
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Install the Prometheus recorder and serve `/metrics`.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_metrics_enabled() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Text,
            metrics_enabled: default_metrics_enabled(),
        }
    }
}
