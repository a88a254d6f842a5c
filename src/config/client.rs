//! Client configuration.

use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use url::Url;

/// Dialer configuration for `idissuer-client`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// WebSocket URL of the server endpoint.
    #[serde(default = "default_url")]
    pub url: String,

    /// Number of concurrent connections to open.
    #[serde(default = "default_connections")]
    pub connections: usize,

    /// Per-exchange timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Validate the client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a `ws`/`wss` URL or no
    /// connections are requested.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.url)
            .map_err(|e| ConfigError::Message(format!("client.url is invalid: {e}")))?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::Message(format!(
                "client.url must use ws or wss, got {}",
                url.scheme()
            )));
        }

        if self.connections == 0 {
            return Err(ConfigError::Message(
                "client.connections cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Per-exchange timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_url() -> String {
    "ws://127.0.0.1:8080/ws".to_string()
}

const fn default_connections() -> usize {
    10
}

const fn default_timeout_secs() -> u64 {
    5
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            connections: default_connections(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
