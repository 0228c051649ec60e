//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the counter and cache stores selected by config
//! - Report every startup failure as a `StartupError`
//!
//! # Design Decisions
//! - Fail fast: a bad Redis URL stops startup, an unreachable Redis does not
//!   (stores connect lazily and apply their failure policy per request)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, StoreBackend, StoreConfig};
use crate::store::{CacheStore, CounterStore, MemoryStore, RedisStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open store: {0}")]
    Store(#[from] StoreError),

    #[error("invalid socket address '{address}'")]
    Address { address: String },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// The shared stores injected into the rate limiter and the response cache.
pub struct Stores {
    pub counters: Arc<dyn CounterStore>,
    pub cache: Arc<dyn CacheStore>,
    /// Set for the in-process backend, which needs a sweeper task.
    pub memory: Option<Arc<MemoryStore>>,
}

impl Stores {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            counters: store.clone(),
            cache: store.clone(),
            memory: Some(store),
        }
    }
}

pub fn build_stores(config: &StoreConfig) -> Result<Stores, StoreError> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-process store");
            Ok(Stores::memory())
        }
        StoreBackend::Redis => {
            let store = Arc::new(RedisStore::open(
                &config.redis_url,
                config.key_prefix.clone(),
                std::time::Duration::from_millis(config.op_timeout_ms),
            )?);
            tracing::info!(url = %config.redis_url, prefix = %config.key_prefix, "Using Redis store");
            Ok(Stores {
                counters: store.clone(),
                cache: store,
                memory: None,
            })
        }
    }
}
