mod auth;
mod cache;
mod catalog;
mod collection;
mod config;
mod db;
mod errors;
mod extract;
mod games;
mod jobs;
mod middleware;
mod models;
mod reviews;
mod routes;
mod state;
mod stats;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use axum::http::{header, HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{CacheStore, MemoryCache, RedisCache};
use crate::catalog::{CatalogCache, RawgClient};
use crate::config::Config;
use crate::db::{create_pool, run_migrations, Repos};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting GameVault API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Initialize cache backend
    let cache: Arc<dyn CacheStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisCache::connect(url).await?),
        None => {
            warn!("REDIS_URL not set; using in-process cache (not shared across instances)");
            Arc::new(MemoryCache::new())
        }
    };

    // Initialize upstream catalog client
    let rawg = RawgClient::new(&config.rawg_base_url, config.rawg_api_key.clone())?;
    let catalog = CatalogCache::new(Arc::new(rawg), cache.clone());
    info!("Catalog client initialized ({})", config.rawg_base_url);

    // Start background workers
    let (jobs, workers) = jobs::start(config.job_workers, cache.clone());

    let cors = build_cors(&config)?;
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;

    // Build app state
    let state = AppState {
        repos: Repos::postgres(db),
        cache,
        catalog,
        jobs,
        config,
        started_at: Instant::now(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!("Listening on {addr}");
    info!("API description at http://{addr}{}", routes::docs::DOCS_PATH);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router owned every queue producer; workers drain and exit.
    info!("Server stopped, draining background jobs");
    workers.join().await;

    Ok(())
}

/// Any origin in development, only `FRONTEND_URL` otherwise.
fn build_cors(config: &Config) -> Result<CorsLayer> {
    if config.is_development() {
        return Ok(CorsLayer::permissive());
    }

    let origin: HeaderValue = config.frontend_url.parse()?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
