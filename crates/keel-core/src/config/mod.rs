//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: Hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML file specified by `KEEL_CONFIG` env var
//! 3. **Environment variables**: `KEEL__*` env vars override specific fields
//!
//! # Configuration Sections
//!
//! - [`UpstreamsConfig`]: Ordered endpoint definitions (order is priority)
//! - [`RpcConfig`]: Fan-out timeouts, consensus window, multicall address
//! - [`IngestConfig`]: Block ingestion loop tuning and commit order
//! - [`CheckpointConfig`]: Where the ingestion loop persists its cursor
//! - [`LoggingConfig`]: Log level and format
//!
//! # Validation
//!
//! Configuration is validated after loading. Invalid configurations (e.g.,
//! no endpoints, zero timeouts, invalid URLs) return errors rather than failing
//! silently.
//!
//! # Example
//!
//! ```toml
//! [[upstreams.providers]]
//! name = "primary"
//! url = "https://rpc.example.com"
//!
//! [[upstreams.providers]]
//! name = "fallback"
//! url = "https://rpc.fallback.example.org"
//!
//! [rpc]
//! consensus_window = 5
//!
//! [ingest]
//! batch_size = 10
//! commit_order = "after_announce"
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{path::Path, sync::Arc, time::Duration};

use crate::upstream::{EndpointConfig, FailurePolicy, FanOutTimeouts};

pub use crate::ingest::config::{CommitOrder, IngestConfig};

/// Default multicall helper contract, deployed at the same address on most chains.
pub const DEFAULT_MULTICALL_ADDRESS: &str = "0xcA11bde05977b3631167028862bE2a173976CA11";

/// Configuration for a single JSON-RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamProvider {
    /// Human-readable identifier used in logs (e.g., "alchemy", "public-1").
    pub name: String,

    /// HTTP(S) endpoint URL. Must start with `http` or `https`.
    pub url: String,

    /// Upper bound for a single HTTP exchange in seconds. Defaults to `30`.
    ///
    /// Fan-out calls are raced against the shorter [`RpcConfig`] timeouts; this
    /// only bounds requests the executor has already abandoned.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl UpstreamProvider {
    #[must_use]
    pub fn endpoint_config(&self) -> EndpointConfig {
        EndpointConfig {
            name: Arc::from(self.name.as_str()),
            url: self.url.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

/// Ordered list of endpoints. The first entry has the highest priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamsConfig {
    /// Configured endpoints. Cannot be empty.
    #[serde(default)]
    pub providers: Vec<UpstreamProvider>,

    /// Maximum concurrent HTTP requests across all endpoints. Defaults to `256`.
    #[serde(default = "default_concurrent_limit")]
    pub concurrent_limit: usize,
}

fn default_concurrent_limit() -> usize {
    256
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self { providers: Vec::new(), concurrent_limit: default_concurrent_limit() }
    }
}

/// Facade settings: fan-out timeouts and consensus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Timeout for height queries in milliseconds. Defaults to `500`.
    pub height_timeout_ms: u64,

    /// Timeout for block, transaction, receipt and call queries. Defaults to `3000`.
    pub request_timeout_ms: u64,

    /// Log queries use `request_timeout_ms * log_timeout_multiplier`. Defaults to `3`.
    pub log_timeout_multiplier: u32,

    /// Half-width of the consensus window around the median height. Defaults to `5`.
    pub consensus_window: u64,

    /// Multicall helper contract used by batched calls.
    pub multicall_address: String,

    /// Poll interval while waiting for confirmations. Defaults to `1000`.
    pub receipt_poll_interval_ms: u64,

    /// How log queries treat failed endpoints. Defaults to `degrade_to_empty`.
    pub logs_failure_policy: FailurePolicy,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            height_timeout_ms: 500,
            request_timeout_ms: 3000,
            log_timeout_multiplier: 3,
            consensus_window: 5,
            multicall_address: DEFAULT_MULTICALL_ADDRESS.to_string(),
            receipt_poll_interval_ms: 1000,
            logs_failure_policy: FailurePolicy::DegradeToEmpty,
        }
    }
}

impl RpcConfig {
    #[must_use]
    pub fn fan_out_timeouts(&self) -> FanOutTimeouts {
        FanOutTimeouts {
            height: Duration::from_millis(self.height_timeout_ms),
            standard: Duration::from_millis(self.request_timeout_ms),
            logs_multiplier: self.log_timeout_multiplier,
        }
    }

    #[must_use]
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

/// Where the ingestion loop persists its cursor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// JSON checkpoint file. When unset the cursor is kept in memory only.
    #[serde(default)]
    pub path: Option<String>,
}

/// Application logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (e.g., "trace", "debug", "info", "warn", "error"). Defaults to `"info"`.
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Main application configuration.
///
/// # Example TOML
///
/// ```toml
/// [[upstreams.providers]]
/// name = "primary"
/// url = "https://rpc.example.com"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Endpoint configuration.
    #[serde(default)]
    pub upstreams: UpstreamsConfig,

    /// Fan-out and consensus configuration.
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Block ingestion configuration.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Cursor persistence.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// Environment variables with the `KEEL__` prefix can override any configuration value.
    /// Use `__` as a separator for nested fields (e.g., `KEEL__INGEST__BATCH_SIZE=10`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("upstreams.concurrent_limit", 256)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("KEEL").prefix_separator("__").separator("__"))
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `config/config.toml` with fallback to defaults.
    ///
    /// The config file path can be overridden using the `KEEL_CONFIG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("KEEL_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Validates the configuration.
    ///
    /// Checks that:
    /// - At least one endpoint is configured, each with a name and an HTTP(S) URL
    /// - Endpoint names are unique
    /// - All timeouts, intervals and sizes are greater than zero where required
    /// - Logging format is either `"json"` or `"pretty"`
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.upstreams.providers.is_empty() {
            return Err("No upstream RPC endpoints configured".to_string());
        }

        for (i, provider) in self.upstreams.providers.iter().enumerate() {
            if provider.name.is_empty() {
                return Err(format!("Upstream #{i} has an empty name"));
            }
            if !provider.url.starts_with("http://") && !provider.url.starts_with("https://") {
                return Err(format!("Invalid URL for upstream {}: {}", provider.name, provider.url));
            }
            if provider.timeout_seconds == 0 {
                return Err(format!("Timeout for upstream {} must be greater than 0", provider.name));
            }
            if self.upstreams.providers[..i].iter().any(|p| p.name == provider.name) {
                return Err(format!("Duplicate upstream name: {}", provider.name));
            }
        }

        if self.upstreams.concurrent_limit == 0 {
            return Err("Upstream concurrent limit must be greater than 0".to_string());
        }

        if self.rpc.height_timeout_ms == 0 || self.rpc.request_timeout_ms == 0 {
            return Err("RPC timeouts must be greater than 0".to_string());
        }

        if self.rpc.log_timeout_multiplier == 0 {
            return Err("Log timeout multiplier must be greater than 0".to_string());
        }

        if self.rpc.receipt_poll_interval_ms == 0 {
            return Err("Receipt poll interval must be greater than 0".to_string());
        }

        if !is_address(&self.rpc.multicall_address) {
            return Err(format!("Invalid multicall address: {}", self.rpc.multicall_address));
        }

        self.ingest.validate()?;

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }
}

fn is_address(value: &str) -> bool {
    value.len() == 42 &&
        value.starts_with("0x") &&
        value[2..].bytes().all(|b| b.is_ascii_hexdigit())
}
