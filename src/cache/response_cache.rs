//! TTL response cache for idempotent reads.
//!
//! # Responsibilities
//! - Decide which requests are cache candidates (GET to a cacheable service)
//! - Look up live entries, treating store failures as misses
//! - Store 2xx backend responses with the configured TTL
//!
//! # Design Decisions
//! - Fails closed: an unreachable or inconsistent store never serves data
//! - Error responses are never stored and never evict a good entry
//! - The store owns expiry; this layer never returns an expired entry

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, Method};

use crate::cache::key::CacheKey;
use crate::config::CacheConfig;
use crate::http::response::ProxyResponse;
use crate::observability::metrics;
use crate::store::CacheStore;

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Hit(ProxyResponse),
    Miss,
}

/// Response cache over an injected [`CacheStore`].
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    cacheable_services: HashSet<String>,
    vary: Vec<HeaderName>,
}

impl ResponseCache {
    pub fn new(
        store: Arc<dyn CacheStore>,
        ttl: Duration,
        cacheable_services: impl IntoIterator<Item = String>,
        vary: Vec<HeaderName>,
    ) -> Self {
        Self {
            store,
            ttl,
            cacheable_services: cacheable_services.into_iter().collect(),
            vary,
        }
    }

    /// Build from config. Unparseable vary header names are skipped; they are
    /// rejected earlier by config validation.
    pub fn from_config(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        let vary = config
            .vary_headers
            .iter()
            .filter_map(|name| HeaderName::from_bytes(name.as_bytes()).ok())
            .collect();
        Self::new(
            store,
            Duration::from_secs(config.ttl_secs),
            config.cacheable_services.iter().cloned(),
            vary,
        )
    }

    /// Configured entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether a request to `service` with `method` may be served from or
    /// written to the cache.
    pub fn is_cacheable(&self, method: &Method, service: &str) -> bool {
        *method == Method::GET && self.cacheable_services.contains(service)
    }

    /// Key for a cacheable request.
    pub fn key_for(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        headers: &HeaderMap,
    ) -> CacheKey {
        CacheKey::derive(method, path, query, headers, &self.vary)
    }

    /// Look up a live entry.
    pub async fn get(&self, key: &CacheKey) -> Lookup {
        match self.store.get(key.as_str()).await {
            Ok(Some(response)) => {
                metrics::record_cache_lookup("hit");
                Lookup::Hit(response)
            }
            Ok(None) => {
                metrics::record_cache_lookup("miss");
                Lookup::Miss
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache store unavailable, treating as miss");
                metrics::record_store_error("cache");
                metrics::record_cache_lookup("error");
                Lookup::Miss
            }
        }
    }

    /// Store `response` under `key` for `ttl`. Non-2xx responses are ignored.
    ///
    /// Returns whether the response was stored.
    pub async fn put(&self, key: &CacheKey, response: &ProxyResponse, ttl: Duration) -> bool {
        if !response.is_success() {
            tracing::debug!(key = %key, status = %response.status, "Not caching non-2xx response");
            return false;
        }

        match self.store.put(key.as_str(), response, ttl).await {
            Ok(()) => {
                tracing::debug!(key = %key, ttl = ?ttl, "Cached response");
                true
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache store unavailable, response not cached");
                metrics::record_store_error("cache");
                false
            }
        }
    }
}
