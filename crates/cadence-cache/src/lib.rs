//! # cadence-cache
//!
//! Read-through caching for cadence task views.
//!
//! This crate provides:
//! - Redis and in-process [`CacheStore`](cadence_core::CacheStore) backends
//! - Cache key templates for every cached projection
//! - The invalidation protocol mapping store mutations to stale keys
//! - [`TaskCache`], the read-through layer used by handlers and jobs

pub mod config;
pub mod keys;
pub mod memory_cache;
pub mod protocol;
pub mod redis_cache;
pub mod snapshot;
pub mod task_cache;

pub use config::CacheConfig;
pub use keys::CacheKey;
pub use memory_cache::MemoryCache;
pub use protocol::{keys_to_invalidate, Mutation};
pub use redis_cache::RedisCache;
pub use snapshot::TaskSnapshot;
pub use task_cache::{CacheStats, TaskCache};
