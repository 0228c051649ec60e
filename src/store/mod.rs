//! Shared key-value stores backing admission control and the response cache.
//!
//! # Data Flow
//! ```text
//! RateLimiter.admit
//!     → CounterStore::increment (atomic INCR + expiry on first hit)
//!
//! ResponseCache.get / put
//!     → CacheStore::get / put (TTL enforced by the store)
//! ```
//!
//! # Design Decisions
//! - Stores are injected as trait objects; nothing reaches for global state
//! - The increment is the unit of mutual exclusion, no lock is layered on top
//! - Callers decide failure policy; stores only report `StoreError`

pub mod memory;
pub mod redis_store;

use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::http::response::ProxyResponse;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

/// Failure talking to a backing store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store returned malformed data: {0}")]
    Corrupt(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Counter storage with atomic increment-with-expiry.
pub trait CounterStore: Send + Sync {
    /// Increment the counter for `key` and return the new count.
    ///
    /// When the returned count is 1 the counter expires `window` from now.
    /// Later increments in the same window never move the expiry. Once
    /// expired, the next increment starts again from 1.
    fn increment<'a>(
        &'a self,
        key: &'a str,
        window: Duration,
    ) -> BoxFuture<'a, Result<u64, StoreError>>;
}

/// Response storage with per-entry expiry.
pub trait CacheStore: Send + Sync {
    /// Fetch a live entry. Expired entries are never returned.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<ProxyResponse>, StoreError>>;

    /// Store `response` under `key`, replacing any previous entry.
    fn put<'a>(
        &'a self,
        key: &'a str,
        response: &'a ProxyResponse,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<(), StoreError>>;
}
