//! Fixed-window request ceiling per (client IP, route).
//!
//! The counter starts at 1 with the window as its TTL and is incremented
//! until it reaches the ceiling; the window resets when the key expires.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::cache::CacheStore;
use crate::errors::AppError;
use crate::state::AppState;

pub fn rate_limit_key(ip: &str, route: &str) -> String {
    format!("ratelimit:{ip}:{route}")
}

/// First `X-Forwarded-For` hop, else the socket peer, else `unknown`.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Counts one request against `key`. Cache failures let the request through.
pub async fn check(
    cache: &dyn CacheStore,
    key: &str,
    max: u64,
    window_secs: u64,
) -> Result<(), AppError> {
    let current = match cache.get(key).await {
        Ok(value) => value.and_then(|v| v.parse::<u64>().ok()),
        Err(e) => {
            warn!("Rate limiter unavailable, allowing request: {e}");
            return Ok(());
        }
    };

    match current {
        Some(count) if count >= max => {
            let retry_after = cache.ttl(key).await.ok().flatten().unwrap_or(window_secs);
            Err(AppError::TooManyRequests { retry_after })
        }
        Some(_) => {
            if let Err(e) = cache.incr(key).await {
                warn!("Rate limiter increment failed for {key}: {e}");
            }
            Ok(())
        }
        None => {
            if let Err(e) = cache.set_ex(key, "1", window_secs).await {
                warn!("Rate limiter write failed for {key}: {e}");
            }
            Ok(())
        }
    }
}

pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let key = rate_limit_key(&client_ip(request.headers(), peer), &route);

    check(
        state.cache.as_ref(),
        &key,
        state.config.rate_limit_max,
        state.config.rate_limit_window_secs,
    )
    .await?;

    Ok(next.run(request).await)
}
