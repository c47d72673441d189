//! Upstream game catalog (RAWG).
//!
//! `CatalogClient` is the only way the service talks to the upstream API.
//! `CatalogCache` puts the cache-aside policy in front of it and is what
//! handlers and the game resolver use.

pub mod cached;
pub mod handlers;
pub mod rawg;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::errors::AppError;

pub use cached::CatalogCache;
pub use rawg::RawgClient;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found upstream")]
    NotFound,

    #[error("Upstream returned status {0}")]
    Status(u16),

    #[error("Unexpected upstream payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound => AppError::NotFound("Game not found".to_string()),
            CatalogError::Status(status) => AppError::Upstream {
                status,
                message: format!("catalog returned {status}"),
            },
            CatalogError::Http(e) => AppError::Upstream {
                status: 502,
                message: e.to_string(),
            },
            CatalogError::Payload(e) => AppError::Upstream {
                status: 502,
                message: e.to_string(),
            },
        }
    }
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Raw search response for one page of results.
    async fn search(&self, query: &str, page: u32) -> Result<Value, CatalogError>;
    /// Raw detail response for one upstream id.
    async fn game(&self, rawg_id: i64) -> Result<Value, CatalogError>;
    async fn ping(&self) -> Result<(), CatalogError>;
}
