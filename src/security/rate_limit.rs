//! Fixed-window admission control per client.

use std::sync::Arc;
use std::time::Duration;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::client_key::ClientKey;
use crate::store::CounterStore;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

/// Fixed-window rate limiter over an injected [`CounterStore`].
///
/// Every call performs one atomic increment; the post-increment count alone
/// decides the outcome, so concurrent callers for the same client can never
/// both observe a fresh window.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    limit: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, limit: u64, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
        }
    }

    pub fn from_config(store: Arc<dyn CounterStore>, config: &RateLimitConfig) -> Self {
        Self::new(store, config.limit, Duration::from_secs(config.window_secs))
    }

    /// Count this request against `client` and decide whether it may proceed.
    ///
    /// Fails open: if the counter store cannot be reached the request is
    /// allowed and a warning is logged.
    pub async fn admit(&self, client: &ClientKey) -> Admission {
        match self.store.increment(client.as_str(), self.window).await {
            Ok(count) if count > self.limit => {
                tracing::warn!(client = %client, count, limit = self.limit, "Rate limit exceeded");
                metrics::record_rate_limited();
                Admission::Denied
            }
            Ok(_) => Admission::Allowed,
            Err(e) => {
                tracing::warn!(client = %client, error = %e, "Counter store unavailable, admitting request");
                metrics::record_store_error("counter");
                Admission::Allowed
            }
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
