//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, inbound body limit).
    pub listener: ListenerConfig,

    /// Backend services addressable as `/api/{name}`.
    pub services: Services,

    /// Per-client admission control.
    pub rate_limit: RateLimitConfig,

    /// Response caching for idempotent reads.
    pub cache: CacheConfig,

    /// Backing store for counters and cached responses.
    pub store: StoreConfig,

    /// Outbound HTTP client settings.
    pub upstream: UpstreamConfig,

    /// Cross-origin settings for browser frontends.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Largest inbound request body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// A backend service reachable through the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Path segment clients use, e.g. `persons` in `/api/persons/...`.
    pub name: String,

    /// Base URL requests are forwarded to.
    pub base_url: String,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }
}

/// The configured service list.
///
/// A `[[services]]` table in the config file replaces the defaults entirely.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Services(pub Vec<ServiceConfig>);

impl Default for Services {
    fn default() -> Self {
        let services = ["persons", "habits", "habit_events", "analytics", "system"]
            .into_iter()
            .map(|name| ServiceConfig::new(name, format!("http://localhost:5000/api/{}", name)))
            .collect();
        Self(services)
    }
}

impl std::ops::Deref for Services {
    type Target = [ServiceConfig];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests admitted per client within one window.
    pub limit: u64,

    /// Fixed window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 100,
            window_secs: 60,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable response caching.
    pub enabled: bool,

    /// Lifetime of a cached response in seconds.
    pub ttl_secs: u64,

    /// Services whose GET responses may be cached.
    pub cacheable_services: Vec<String>,

    /// Request headers that take part in the cache key.
    pub vary_headers: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 30,
            cacheable_services: vec![
                "persons".to_string(),
                "habits".to_string(),
                "analytics".to_string(),
            ],
            vary_headers: vec!["accept".to_string()],
        }
    }
}

/// Which store backs counters and cache entries.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local concurrent map. Counters are per gateway instance.
    #[default]
    Memory,
    /// Shared Redis instance. Counters are shared by every gateway instance.
    Redis,
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Redis connection URL (used when `backend = "redis"`).
    pub redis_url: String,

    /// Prefix for every key written to Redis.
    pub key_prefix: String,

    /// Upper bound on a single store round trip in milliseconds.
    pub op_timeout_ms: u64,

    /// How often the memory store evicts expired entries, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "gateway".to_string(),
            op_timeout_ms: 250,
            sweep_interval_secs: 30,
        }
    }
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Total time allowed for one backend call (connect, head and body) in milliseconds.
    pub timeout_ms: u64,

    /// Largest backend response body relayed, in bytes.
    pub max_response_bytes: usize,

    /// How long idle pooled connections are kept, in seconds.
    pub pool_idle_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_response_bytes: 16 * 1024 * 1024,
            pool_idle_timeout_secs: 90,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,

    /// Origins allowed to call the gateway with credentials.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
