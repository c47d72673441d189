//! Time-expiring key/value cache.
//!
//! Backends implement `CacheStore`; `RedisCache` in production and
//! `MemoryCache` when no `REDIS_URL` is configured (and in tests).
//!
//! Key patterns:
//!
//! ```text
//! search:{normalized q}:{page}   → upstream search response   (1 h)
//! game:{rawg id}                 → upstream detail response   (24 h)
//! stats:{user id}                → UserStats snapshot          (10 s)
//! stats:global                   → GlobalStats snapshot        (10 min)
//! ratelimit:{ip}:{route}         → request counter             (window)
//! ```

mod memory;
mod redis_store;

pub use memory::MemoryCache;
pub use redis_store::RedisCache;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Stored value is not a counter: {0}")]
    NotACounter(String),
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    /// Increments an integer value, creating it at 1 without expiry if absent.
    async fn incr(&self, key: &str) -> Result<u64, CacheError>;
    /// Remaining lifetime in seconds; `None` if the key is missing or never expires.
    async fn ttl(&self, key: &str) -> Result<Option<u64>, CacheError>;
    async fn ping(&self) -> Result<(), CacheError>;
}

/// Reads and deserializes a cached JSON value.
/// Backend and decode failures are logged and treated as a miss.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn CacheStore, key: &str) -> Option<T> {
    match cache.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache hit: {key}");
                Some(value)
            }
            Err(e) => {
                warn!("Discarding undecodable cache entry {key}: {e}");
                None
            }
        },
        Ok(None) => {
            debug!("Cache miss: {key}");
            None
        }
        Err(e) => {
            warn!("Cache read failed for {key}: {e}");
            None
        }
    }
}

/// Serializes and stores a JSON value. Failures are logged and skipped.
pub async fn put_json<T: Serialize + ?Sized>(
    cache: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl_secs: u64,
) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Could not serialize cache entry {key}: {e}");
            return;
        }
    };
    if let Err(e) = cache.set_ex(key, &raw, ttl_secs).await {
        warn!("Cache write failed for {key}: {e}");
    }
}
