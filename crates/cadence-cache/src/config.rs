//! Cache backend selection.

use std::sync::Arc;

use tracing::info;

use cadence_core::{defaults, CacheStore};

use crate::memory_cache::MemoryCache;
use crate::redis_cache::RedisCache;
use crate::task_cache::TaskCache;

/// Which cache backend to run and how long entries live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Use Redis when true, the in-process LRU otherwise.
    pub redis_enabled: bool,
    pub redis_url: String,
    pub ttl_secs: u64,
    /// Capacity of the in-process cache.
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_enabled: true,
            redis_url: defaults::REDIS_URL.to_string(),
            ttl_secs: defaults::CACHE_TTL_SECS,
            memory_capacity: defaults::MEMORY_CACHE_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Reads:
    /// - `REDIS_ENABLED` (default: true)
    /// - `REDIS_URL` (default: redis://localhost:6379)
    /// - `REDIS_CACHE_TTL` (default: 3600 seconds)
    /// - `MEMORY_CACHE_CAPACITY` (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_enabled: std::env::var("REDIS_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(defaults.redis_enabled),
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            ttl_secs: std::env::var("REDIS_CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ttl_secs),
            memory_capacity: std::env::var("MEMORY_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.memory_capacity),
        }
    }

    /// In-process cache only.
    pub fn in_memory() -> Self {
        Self {
            redis_enabled: false,
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Build the configured cache store.
    pub async fn connect_store(&self) -> Arc<dyn CacheStore> {
        if self.redis_enabled {
            Arc::new(RedisCache::connect(&self.redis_url).await)
        } else {
            info!(
                subsystem = "cache",
                component = "memory",
                capacity = self.memory_capacity,
                "Redis disabled via REDIS_ENABLED=false, using in-process cache"
            );
            Arc::new(MemoryCache::new(self.memory_capacity))
        }
    }

    /// Build the read-through cache over the configured store.
    pub async fn connect(&self) -> TaskCache {
        TaskCache::with_ttl(self.connect_store().await, self.ttl_secs)
    }
}
