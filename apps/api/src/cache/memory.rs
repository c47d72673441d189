use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::{CacheError, CacheStore};

struct Slot {
    value: String,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Process-local cache. Expired entries are dropped lazily on access.
#[derive(Default)]
pub struct MemoryCache {
    slots: DashMap<String, Slot>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        self.slots.remove_if(key, |_, slot| !slot.is_live(now));
        Ok(self.slots.get(key).map(|slot| slot.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        self.slots.insert(
            key.to_string(),
            Slot {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.slots.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<u64, CacheError> {
        let now = Instant::now();
        self.slots.remove_if(key, |_, slot| !slot.is_live(now));
        let mut slot = self.slots.entry(key.to_string()).or_insert_with(|| Slot {
            value: "0".to_string(),
            expires_at: None,
        });
        let next = slot
            .value
            .parse::<u64>()
            .map_err(|_| CacheError::NotACounter(key.to_string()))?
            + 1;
        slot.value = next.to_string();
        Ok(next)
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, CacheError> {
        let now = Instant::now();
        Ok(self
            .slots
            .get(key)
            .filter(|slot| slot.is_live(now))
            .and_then(|slot| slot.expires_at)
            .map(|at| at.saturating_duration_since(now).as_secs()))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
