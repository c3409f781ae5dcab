//! Redis-backed cache store.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `REDIS_ENABLED`: Set to "false" to disable Redis (default: true)
//! - `REDIS_URL`: Redis connection URL (default: redis://localhost:6379)
//! - `REDIS_CACHE_TTL`: Cache TTL in seconds (default: 3600)

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use cadence_core::{CacheStore, Error, Result};

/// Key prefix so cadence can share a Redis instance.
pub const KEY_PREFIX: &str = "cadence:";

/// Cache store backed by Redis.
///
/// A cache that failed to connect at startup stays disabled: every read is a
/// miss and every write is dropped, so requests fall back to the store.
#[derive(Clone)]
pub struct RedisCache {
    /// Redis connection manager (None if disabled).
    connection: Option<ConnectionManager>,
}

impl RedisCache {
    /// Connect to `url`, degrading to a disabled cache on failure.
    pub async fn connect(url: &str) -> Self {
        let connection = match redis::Client::open(url) {
            Ok(client) => match ConnectionManager::new(client).await {
                Ok(conn) => {
                    info!(
                        subsystem = "cache",
                        component = "redis",
                        url = %redact_url(url),
                        "Redis cache connected"
                    );
                    Some(conn)
                }
                Err(e) => {
                    warn!(subsystem = "cache", component = "redis", error = %e, "Failed to connect to Redis, cache disabled");
                    None
                }
            },
            Err(e) => {
                warn!(subsystem = "cache", component = "redis", error = %e, "Invalid Redis URL, cache disabled");
                None
            }
        };

        Self { connection }
    }

    /// Create a disabled cache.
    pub fn disabled() -> Self {
        Self { connection: None }
    }

    /// Check if the cache holds a live connection.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn prefixed(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }
}

/// `url` with the password (if any) masked, for logging.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _password)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(mut conn) = self.connection.clone() else {
            return Ok(None);
        };
        conn.get::<_, Option<String>>(Self::prefixed(key))
            .await
            .map_err(|e| Error::Cache(format!("Redis GET error: {}", e)))
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let Some(mut conn) = self.connection.clone() else {
            return Ok(());
        };
        conn.set_ex::<_, _, ()>(Self::prefixed(key), value, ttl_secs)
            .await
            .map_err(|e| Error::Cache(format!("Redis SET error: {}", e)))?;
        debug!(cache_key = key, ttl_secs, "Cache SET");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.delete_many(&[key.to_string()]).await
    }

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        let Some(mut conn) = self.connection.clone() else {
            return Ok(());
        };
        if keys.is_empty() {
            return Ok(());
        }
        let prefixed: Vec<String> = keys.iter().map(|k| Self::prefixed(k)).collect();
        conn.del::<_, ()>(prefixed)
            .await
            .map_err(|e| Error::Cache(format!("Redis DEL error: {}", e)))
    }
}
