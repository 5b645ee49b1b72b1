//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (prefix: `PULSARBEAM_`)
//! 2. Current working directory: `./config.toml`
//! 3. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub broker: BrokerConfig,
    pub auth: AuthConfig,
    pub worker_pool: WorkerPoolConfig,

    /// Optional allow-list of persistence tokens this deployment accepts.
    /// Empty means both `persistent` and `non-persistent` are accepted.
    #[serde(default)]
    pub persistence_filters: Vec<String>,
}

/// Service-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Broker connectivity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker URL used when the `PulsarUrl` header is absent.
    pub default_url: String,

    /// Allow-list of broker URLs a request may name via `PulsarUrl`.
    #[serde(default)]
    pub allowed_urls: Vec<String>,

    /// Header read for the bearer token forwarded to the broker.
    /// An empty string disables token forwarding entirely.
    #[serde(default = "default_token_header_name")]
    pub token_header_name: String,
}

/// Authorization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Subjects that bypass tenant authorization.
    #[serde(default)]
    pub super_roles: Vec<String>,

    /// Path to the public key used to verify caller-supplied bearer tokens.
    /// Absent means tokens are forwarded but not locally verified.
    #[serde(default)]
    pub jwt_public_key_path: Option<PathBuf>,

    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,
}

/// Worker pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    #[serde(default = "default_worker_pool_size")]
    pub size: usize,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_name() -> String {
    "pulsar-beam".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_token_header_name() -> String {
    "Authorization".to_string()
}
fn default_jwt_algorithm() -> String {
    "RS256".to_string()
}
fn default_worker_pool_size() -> usize {
    num_cpus()
}
fn default_queue_capacity() -> usize {
    256
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: default_name(),
                port: default_port(),
                log_level: default_log_level(),
                timeout_secs: default_timeout(),
            },
            broker: BrokerConfig {
                default_url: "pulsar://127.0.0.1:6650".to_string(),
                allowed_urls: Vec::new(),
                token_header_name: default_token_header_name(),
            },
            auth: AuthConfig {
                super_roles: Vec::new(),
                jwt_public_key_path: None,
                jwt_algorithm: default_jwt_algorithm(),
            },
            worker_pool: WorkerPoolConfig {
                size: default_worker_pool_size(),
                queue_capacity: default_queue_capacity(),
            },
            persistence_filters: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, `./config.toml`, then environment
    /// variables prefixed `PULSARBEAM_`, in ascending precedence.
    pub fn load() -> Result<Self> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("PULSARBEAM_").split("_"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Eager startup validation so misconfiguration fails fast rather than
    /// surfacing as a confusing runtime error on the first request.
    pub fn validate(&self) -> Result<()> {
        if self.service.name.trim().is_empty() {
            return Err(Error::Internal("service.name must not be empty".into()));
        }
        if self.service.port == 0 {
            return Err(Error::Internal("service.port must be non-zero".into()));
        }
        if self.broker.default_url.trim().is_empty() {
            return Err(Error::Internal("broker.default_url must not be empty".into()));
        }
        if self.worker_pool.size == 0 {
            return Err(Error::Internal("worker_pool.size must be non-zero".into()));
        }
        Ok(())
    }

    /// Whether `url` is permitted on the `PulsarUrl` header: either on the
    /// allow-list, or empty (use the default).
    pub fn is_allowed_broker_url(&self, url: &str) -> bool {
        url.is_empty() || self.broker.allowed_urls.iter().any(|u| u == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.service.port, 8080);
    }

    #[test]
    fn empty_service_name_fails_validation() {
        let mut config = Config::default();
        config.service.name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn allow_list_permits_empty_and_listed_urls() {
        let mut config = Config::default();
        config.broker.allowed_urls = vec!["pulsar://broker-a:6650".to_string()];
        assert!(config.is_allowed_broker_url(""));
        assert!(config.is_allowed_broker_url("pulsar://broker-a:6650"));
        assert!(!config.is_allowed_broker_url("pulsar://broker-b:6650"));
    }
}
