//! Process-local store on a sharded concurrent map.

use std::future::ready;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::http::response::ProxyResponse;
use crate::store::{CacheStore, CounterStore, StoreError};

/// Stand-in expiry for durations past the clock's range.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn expiry(now: Instant, after: Duration) -> Instant {
    now.checked_add(after)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

#[derive(Debug)]
struct Counter {
    count: u64,
    expires_at: Instant,
}

#[derive(Debug)]
struct Entry {
    response: ProxyResponse,
    expires_at: Instant,
}

/// In-memory counters and cache entries.
///
/// Each key lives in one DashMap shard; the shard's write lock held by
/// `entry()` makes increment-and-maybe-set-expiry a single atomic step.
#[derive(Debug, Default)]
pub struct MemoryStore {
    counters: DashMap<String, Counter>,
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn increment_now(&self, key: &str, window: Duration) -> u64 {
        let now = Instant::now();
        let mut counter = self.counters.entry(key.to_string()).or_insert(Counter {
            count: 0,
            expires_at: now,
        });

        if counter.expires_at <= now {
            counter.count = 0;
        }
        counter.count += 1;
        if counter.count == 1 {
            counter.expires_at = expiry(now, window);
        }
        counter.count
    }

    fn get_now(&self, key: &str) -> Option<ProxyResponse> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.response.clone()),
            Some(_) => {}
            None => return None,
        }
        // Expired: evict unless a fresh put raced in.
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    /// Drop expired counters and cache entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.counters.len() + self.entries.len();
        self.counters.retain(|_, counter| counter.expires_at > now);
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.counters.len() + self.entries.len())
    }

    /// Number of live and not-yet-purged cache entries.
    pub fn cached_entries(&self) -> usize {
        self.entries.len()
    }

    /// Periodically purge expired data until shutdown is signalled.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        every: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = self.purge_expired();
                        if removed > 0 {
                            tracing::debug!(removed, "Purged expired store entries");
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}

impl CounterStore for MemoryStore {
    fn increment<'a>(
        &'a self,
        key: &'a str,
        window: Duration,
    ) -> BoxFuture<'a, Result<u64, StoreError>> {
        Box::pin(ready(Ok(self.increment_now(key, window))))
    }
}

impl CacheStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<ProxyResponse>, StoreError>> {
        Box::pin(ready(Ok(self.get_now(key))))
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        response: &'a ProxyResponse,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        let entry = Entry {
            response: response.clone(),
            expires_at: expiry(Instant::now(), ttl),
        };
        self.entries.insert(key.to_string(), entry);
        Box::pin(ready(Ok(())))
    }
}
