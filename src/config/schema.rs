//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the broker.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the broker.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BrokerConfig {
    /// Result cache settings.
    pub cache: CacheConfig,

    /// Secret resolution settings.
    pub secrets: SecretsConfig,

    /// Retry policy applied to upstream calls.
    pub retries: RetryConfig,

    /// Upstream API endpoints and transport timeouts.
    pub upstream: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Which backing store the result cache persists into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Memory,
    File,
}

/// Result cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied when a call site does not pass its own (seconds).
    pub default_ttl_secs: u64,

    /// Backing store.
    pub store: StoreKind,

    /// Path of the JSON document file (file store only).
    pub file_path: Option<String>,

    /// Coalesce concurrent misses on the same key into one upstream call.
    pub single_flight: bool,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 24 * 60 * 60,
            store: StoreKind::Memory,
            file_path: None,
            single_flight: false,
        }
    }
}

/// Where secret values are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretSource {
    /// Process environment variables.
    Env,
    /// One file per secret in a mounted directory.
    Dir,
}

/// Secret provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// How long a fetched secret is trusted before refresh (seconds).
    pub ttl_secs: u64,

    /// Secret source.
    pub source: SecretSource,

    /// Prefix prepended to secret names when reading the environment.
    pub env_prefix: String,

    /// Directory holding secret files (dir source only).
    pub dir: Option<String>,
}

impl SecretsConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60 * 60,
            source: SecretSource::Env,
            env_prefix: String::new(),
            dir: None,
        }
    }
}

/// Whether a classified failure may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityConfig {
    /// Retry every failure.
    #[default]
    Always,
    /// Never retry auth failures or other 4xx responses.
    SkipClientErrors,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub retries: u32,

    /// Delay before the first retry in milliseconds.
    pub min_timeout_ms: u64,

    /// Upper bound for any single backoff delay in milliseconds.
    pub max_timeout_ms: u64,

    /// Exponential growth factor.
    pub factor: f64,

    /// Randomize each delay.
    pub jitter: bool,

    /// Overall budget for all attempts and sleeps in milliseconds.
    pub deadline_ms: Option<u64>,

    /// Which error classes are retried.
    pub eligibility: EligibilityConfig,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 1,
            min_timeout_ms: 1000,
            max_timeout_ms: 5000,
            factor: 2.0,
            jitter: true,
            deadline_ms: None,
            eligibility: EligibilityConfig::Always,
        }
    }
}

/// Upstream provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Generative Language API base URL.
    pub gemini_base_url: String,

    /// Gemini model used for generation.
    pub gemini_model: String,

    /// Custom Search JSON API endpoint.
    pub custom_search_url: String,

    /// YouTube Data API base URL.
    pub youtube_base_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 5,
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            custom_search_url: "https://www.googleapis.com/customsearch/v1".to_string(),
            youtube_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
