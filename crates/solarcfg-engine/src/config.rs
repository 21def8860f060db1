//! Client configuration
//!
//! Layered as defaults, then an optional TOML file, then `SOLARCFG_*`
//! environment variables (`SOLARCFG_BASE_URL`, `SOLARCFG_CASCADE_POLICY`, ...).

use serde::{Deserialize, Serialize};
use solarcfg_core::logging_facility::Profile;
use solarcfg_core::CascadePolicy;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Controller address, e.g. `http://localhost:8080`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path prefix of the configuration API
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Auto-dismiss delay of success notifications
    #[serde(default = "default_notification_ttl_ms")]
    pub notification_ttl_ms: u64,

    #[serde(default)]
    pub cascade_policy: CascadePolicy,

    #[serde(default)]
    pub log_profile: Profile,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_api_prefix() -> String {
    "/api/solar".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_notification_ttl_ms() -> u64 {
    4_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            request_timeout_ms: default_request_timeout_ms(),
            notification_ttl_ms: default_notification_ttl_ms(),
            cascade_policy: CascadePolicy::default(),
            log_profile: Profile::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration, optionally from a file.
    ///
    /// # Errors
    ///
    /// `ConfigError` when the file cannot be parsed or a value has the
    /// wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ClientConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SOLARCFG")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.api_prefix, "/api/solar");
        assert_eq!(config.notification_ttl(), Duration::from_secs(4));
        assert_eq!(config.cascade_policy, CascadePolicy::OnGateChange);
        assert_eq!(config.log_profile, Profile::Development);
    }
}
