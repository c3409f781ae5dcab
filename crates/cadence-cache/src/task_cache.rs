//! Read-through cache for task projections.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use cadence_core::{defaults, CacheStore, Result};

use crate::keys::CacheKey;
use crate::protocol::{keys_to_invalidate, Mutation};

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

/// Read-through cache over a [`CacheStore`].
///
/// Cache faults never surface to callers: a failed or undecodable read is a
/// miss, and a failed write or delete is logged and dropped.
#[derive(Clone)]
pub struct TaskCache {
    store: Arc<dyn CacheStore>,
    ttl_secs: u64,
    counters: Arc<Counters>,
}

impl TaskCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_ttl(store, defaults::CACHE_TTL_SECS)
    }

    pub fn with_ttl(store: Arc<dyn CacheStore>, ttl_secs: u64) -> Self {
        Self {
            store,
            ttl_secs,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }

    /// Return the cached value for `key`, or run `loader`, cache its output
    /// and return it. Loader errors propagate and nothing is cached.
    pub async fn read_through<T, F, Fut>(&self, key: &CacheKey, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = key.to_string();

        match self.store.get(&key).await {
            Ok(Some(data)) => match serde_json::from_str::<T>(&data) {
                Ok(value) => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(subsystem = "cache", cache_key = %key, "Cache HIT");
                    return Ok(value);
                }
                Err(e) => {
                    self.counters.errors.fetch_add(1, Ordering::Relaxed);
                    warn!(subsystem = "cache", cache_key = %key, error = %e, "Cache deserialization error");
                }
            },
            Ok(None) => {
                debug!(subsystem = "cache", cache_key = %key, "Cache MISS");
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                warn!(subsystem = "cache", cache_key = %key, error = %e, "Cache GET failed, reading from store");
            }
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);

        let value = loader().await?;

        match serde_json::to_string(&value) {
            Ok(serialized) => {
                if let Err(e) = self.store.set(&key, &serialized, self.ttl_secs).await {
                    self.counters.errors.fetch_add(1, Ordering::Relaxed);
                    error!(subsystem = "cache", cache_key = %key, error = %e, "Cache SET failed");
                }
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                error!(subsystem = "cache", cache_key = %key, error = %e, "Cache serialization error");
            }
        }

        Ok(value)
    }

    /// Drop every key made stale by `mutation`.
    pub async fn invalidate(&self, mutation: &Mutation) {
        let keys: Vec<String> = keys_to_invalidate(mutation)
            .iter()
            .map(ToString::to_string)
            .collect();
        if keys.is_empty() {
            return;
        }

        match self.store.delete_many(&keys).await {
            Ok(()) => debug!(
                subsystem = "cache",
                mutation = mutation.label(),
                key_count = keys.len(),
                "Cache INVALIDATE"
            ),
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                error!(
                    subsystem = "cache",
                    mutation = mutation.label(),
                    key_count = keys.len(),
                    error = %e,
                    "Cache invalidation failed"
                );
            }
        }
    }
}
