use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{CatalogClient, CatalogError};
use crate::models::game::NewGame;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const SEARCH_PAGE_SIZE: u32 = 20;

/// HTTP client for the RAWG games API.
#[derive(Clone)]
pub struct RawgClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RawgClient {
    pub fn new(base_url: &str, api_key: String) -> Result<Self, CatalogError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;
        let response = check_status(response).await?;
        debug!("RAWG request succeeded: {path}");
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

async fn check_status(response: Response) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(CatalogError::NotFound);
    }
    let body = response.text().await.unwrap_or_default();
    warn!("RAWG returned {status}: {body}");
    Err(CatalogError::Status(status.as_u16()))
}

#[async_trait]
impl CatalogClient for RawgClient {
    async fn search(&self, query: &str, page: u32) -> Result<Value, CatalogError> {
        self.get_json(
            "/games",
            &[
                ("search", query.to_string()),
                ("page", page.to_string()),
                ("page_size", SEARCH_PAGE_SIZE.to_string()),
            ],
        )
        .await
    }

    async fn game(&self, rawg_id: i64) -> Result<Value, CatalogError> {
        self.get_json(&format!("/games/{rawg_id}"), &[]).await
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        self.get_json("/games", &[("page_size", "1".to_string())])
            .await
            .map(|_| ())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Detail payload → canonical game
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlatformSlot {
    platform: Named,
}

/// The subset of RAWG's game detail payload that is persisted.
#[derive(Debug, Deserialize)]
pub struct RawgGameDetail {
    #[serde(default)]
    name: String,
    #[serde(default)]
    slug: String,
    description_raw: Option<String>,
    released: Option<String>,
    rating: Option<f64>,
    metacritic: Option<i32>,
    background_image: Option<String>,
    genres: Option<Vec<Named>>,
    platforms: Option<Vec<PlatformSlot>>,
}

impl RawgGameDetail {
    /// Maps the payload into an insertable game. Missing optional fields
    /// become `None` or empty lists; an unparsable release date is dropped.
    pub fn into_new_game(self, rawg_id: i64) -> NewGame {
        NewGame {
            rawg_id,
            name: self.name,
            slug: self.slug,
            description: self.description_raw,
            released: self
                .released
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            rating: self.rating,
            metacritic: self.metacritic,
            image_url: self.background_image,
            genres: self
                .genres
                .unwrap_or_default()
                .into_iter()
                .map(|g| g.name)
                .collect(),
            platforms: self
                .platforms
                .unwrap_or_default()
                .into_iter()
                .map(|p| p.platform.name)
                .collect(),
        }
    }
}
