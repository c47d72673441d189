use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Liveness only; touches no dependency.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "uptime": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn probe<E: std::fmt::Display>(name: &str, result: Result<(), E>) -> (bool, Value) {
    match result {
        Ok(()) => (true, json!({ "status": "healthy" })),
        Err(e) => {
            tracing::warn!("Health probe {name} failed: {e}");
            (false, json!({ "status": "unhealthy", "error": e.to_string() }))
        }
    }
}

/// GET /health/detailed
/// Probes the store, the cache and the upstream catalog concurrently.
pub async fn detailed_health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (database, cache, catalog) = tokio::join!(
        state.repos.health.ping(),
        state.cache.ping(),
        state.catalog.ping(),
    );

    let (db_ok, database) = probe("database", database);
    let (cache_ok, cache) = probe("cache", cache);
    let (catalog_ok, catalog) = probe("catalog", catalog);
    let healthy = db_ok && cache_ok && catalog_ok;

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "checks": {
            "database": database,
            "cache": cache,
            "catalog": catalog,
            "uptime": state.started_at.elapsed().as_secs(),
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    (status, Json(body))
}
