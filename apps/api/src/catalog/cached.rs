use std::sync::Arc;

use serde_json::Value;

use super::{CatalogClient, CatalogError};
use crate::cache::{self, CacheStore};

pub const SEARCH_TTL_SECS: u64 = 60 * 60;
pub const DETAIL_TTL_SECS: u64 = 24 * 60 * 60;

/// Cache-aside wrapper around the upstream catalog.
///
/// A hit returns the stored upstream response verbatim. There is no
/// invalidation: entries live until their TTL runs out.
#[derive(Clone)]
pub struct CatalogCache {
    client: Arc<dyn CatalogClient>,
    cache: Arc<dyn CacheStore>,
}

impl CatalogCache {
    pub fn new(client: Arc<dyn CatalogClient>, cache: Arc<dyn CacheStore>) -> Self {
        Self { client, cache }
    }

    /// `query` must already be normalized (see `normalize_query`).
    pub async fn search(&self, query: &str, page: u32) -> Result<Value, CatalogError> {
        let key = search_key(query, page);
        if let Some(hit) = cache::get_json::<Value>(self.cache.as_ref(), &key).await {
            return Ok(hit);
        }

        let response = self.client.search(query, page).await?;
        cache::put_json(self.cache.as_ref(), &key, &response, SEARCH_TTL_SECS).await;
        Ok(response)
    }

    pub async fn game(&self, rawg_id: i64) -> Result<Value, CatalogError> {
        let key = detail_key(rawg_id);
        if let Some(hit) = cache::get_json::<Value>(self.cache.as_ref(), &key).await {
            return Ok(hit);
        }

        let response = self.client.game(rawg_id).await?;
        cache::put_json(self.cache.as_ref(), &key, &response, DETAIL_TTL_SECS).await;
        Ok(response)
    }

    /// Checks upstream reachability, bypassing the cache.
    pub async fn ping(&self) -> Result<(), CatalogError> {
        self.client.ping().await
    }
}

/// Trims, lower-cases and collapses inner whitespace so equivalent queries
/// share a cache entry.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn search_key(query: &str, page: u32) -> String {
    format!("search:{query}:{page}")
}

fn detail_key(rawg_id: i64) -> String {
    format!("game:{rawg_id}")
}
