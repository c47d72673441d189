use std::sync::Arc;
use std::time::Instant;

use crate::cache::CacheStore;
use crate::catalog::CatalogCache;
use crate::config::Config;
use crate::db::Repos;
use crate::jobs::JobQueue;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repos,
    /// Response cache, stats snapshots and rate-limit counters.
    pub cache: Arc<dyn CacheStore>,
    pub catalog: CatalogCache,
    pub jobs: JobQueue,
    pub config: Config,
    pub started_at: Instant,
}
