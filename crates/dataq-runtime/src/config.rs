//! Configuration for host connections, the data queue client and logging.
//!
//! Sources are applied in order, later ones overriding earlier ones:
//!  1. an optional file (YAML, TOML or JSON, picked by extension)
//!  2. environment variables with the `DATAQ__` prefix and `__` separator,
//!     e.g. `DATAQ__CONNECTION__HOST=prod400` sets `connection.host`

use crate::error::ConfigurationError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "DATAQ";

/// Password or other credential, wiped from memory on drop.
/// Never included in Debug output or logs.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get secret as string (only for immediate use)
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("length", &self.0.len())
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where and how to sign on
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSettings {
    /// Host name or IP address
    pub host: String,

    /// User profile
    pub user: String,

    pub password: Secret,

    /// Libraries added to the job's library list after sign-on, in order
    #[serde(default, deserialize_with = "deserialize_library_list")]
    pub library_list: Vec<String>,
}

impl ConnectionSettings {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<Secret>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            library_list: Vec::new(),
        }
    }

    /// Set the library list from its comma separated form
    pub fn with_library_list(mut self, libraries: &str) -> Self {
        self.library_list = parse_library_list(libraries);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.host.trim().is_empty() {
            return Err(ConfigurationError::Missing {
                key: "connection.host".to_string(),
            });
        }
        if self.user.trim().is_empty() {
            return Err(ConfigurationError::Missing {
                key: "connection.user".to_string(),
            });
        }
        Ok(())
    }
}

/// Split a comma separated library list, trimming blanks around entries
pub fn parse_library_list(libraries: &str) -> Vec<String> {
    libraries
        .split(',')
        .map(str::trim)
        .filter(|library| !library.is_empty())
        .map(str::to_string)
        .collect()
}

fn deserialize_library_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map(parse_library_list).unwrap_or_default())
}

/// Timing and retry settings of the data queue client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Interval during which a passed health check is trusted without I/O
    pub keep_alive_seconds: u64,

    /// Pause between reconnect attempts
    pub reconnect_wait_seconds: u64,

    /// Reconnect attempts for direct calls, negative for no limit
    pub processor_max_retries: i32,

    /// Reconnect attempts for background polling, negative for no limit
    pub source_max_retries: i32,

    /// Cap on the wait of a single data queue call
    pub max_queue_wait_seconds: u64,

    /// Pause between two polling cycles
    pub poll_interval_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            keep_alive_seconds: 60,
            reconnect_wait_seconds: 10,
            processor_max_retries: 3,
            source_max_retries: -1,
            max_queue_wait_seconds: 30,
            poll_interval_ms: 100,
        }
    }
}

impl ClientSettings {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_seconds)
    }

    pub fn max_queue_wait(&self) -> Duration {
        Duration::from_secs(self.max_queue_wait_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn processor_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.processor_max_retries,
            Duration::from_secs(self.reconnect_wait_seconds),
        )
    }

    pub fn source_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.source_max_retries,
            Duration::from_secs(self.reconnect_wait_seconds),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_queue_wait_seconds == 0 {
            return Err(ConfigurationError::Invalid {
                message: "client.max_queue_wait_seconds must be greater than zero".to_string(),
            });
        }
        if self.keep_alive_seconds == 0 {
            return Err(ConfigurationError::Invalid {
                message: "client.keep_alive_seconds must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataqConfig {
    pub connection: ConnectionSettings,

    #[serde(default)]
    pub client: ClientSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DataqConfig {
    /// Load from an optional file plus `DATAQ__` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    pub fn load_with_env_prefix(
        path: Option<&Path>,
        env_prefix: &str,
    ) -> Result<Self, ConfigurationError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            tracing::info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix(env_prefix).separator("__"))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.connection.validate()?;
        self.client.validate()
    }
}
