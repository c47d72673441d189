//! Shared fixtures: a counting fake catalog, an in-memory harness and
//! request helpers for driving the router with `oneshot`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::cache::MemoryCache;
use crate::catalog::{CatalogCache, CatalogClient, CatalogError};
use crate::collection::{add_game, AddGameRequest};
use crate::config::Config;
use crate::db::memory::MemoryStore;
use crate::db::Repos;
use crate::jobs;
use crate::models::collection::{CollectionEntry, GameStatus};
use crate::models::user::User;
use crate::routes::build_router;
use crate::state::AppState;

/// Catalog double that serves canned payloads and counts upstream calls.
#[derive(Default)]
pub struct FakeCatalog {
    games: Mutex<HashMap<i64, Value>>,
    fail_status: Mutex<Option<u16>>,
    search_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_game(&self, rawg_id: i64, payload: Value) {
        self.games.lock().unwrap().insert(rawg_id, payload);
    }

    /// Makes every subsequent call fail with this upstream status.
    pub fn fail_with_status(&self, status: u16) {
        *self.fail_status.lock().unwrap() = Some(status);
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    fn failure(&self) -> Option<CatalogError> {
        (*self.fail_status.lock().unwrap()).map(CatalogError::Status)
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn search(&self, query: &str, page: u32) -> Result<Value, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure() {
            return Err(err);
        }
        Ok(json!({
            "count": 1,
            "page": page,
            "results": [{ "name": format!("Result for {query}") }]
        }))
    }

    async fn game(&self, rawg_id: i64) -> Result<Value, CatalogError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure() {
            return Err(err);
        }
        self.games
            .lock()
            .unwrap()
            .get(&rawg_id)
            .cloned()
            .ok_or(CatalogError::NotFound)
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        match self.failure() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn hades_payload() -> Value {
    json!({
        "name": "Hades",
        "slug": "hades",
        "description_raw": "Defy the god of the dead.",
        "released": "2020-09-17",
        "rating": 4.6,
        "metacritic": 93,
        "background_image": "https://media.rawg.io/hades.jpg",
        "genres": [{"name": "Action"}, {"name": "Indie"}, {"name": "RPG"}],
        "platforms": [{"platform": {"name": "PC"}}]
    })
}

fn celeste_payload() -> Value {
    json!({
        "name": "Celeste",
        "slug": "celeste",
        "released": "2018-01-25",
        "genres": [{"name": "Platformer"}, {"name": "Indie"}],
        "platforms": [{"platform": {"name": "PC"}}]
    })
}

fn outer_wilds_payload() -> Value {
    json!({
        "name": "Outer Wilds",
        "slug": "outer-wilds",
        "genres": [{"name": "Adventure"}, {"name": "Indie"}, {"name": "Puzzle"}]
    })
}

/// In-memory wiring of every service dependency.
pub struct TestHarness {
    pub repos: Repos,
    pub cache: Arc<MemoryCache>,
    pub fake: Arc<FakeCatalog>,
    pub catalog: CatalogCache,
}

impl TestHarness {
    pub fn new() -> Self {
        let fake = Arc::new(FakeCatalog::new());
        fake.add_game(1001, hades_payload());
        fake.add_game(1002, celeste_payload());
        fake.add_game(1003, outer_wilds_payload());

        let cache = Arc::new(MemoryCache::new());
        let catalog = CatalogCache::new(fake.clone(), cache.clone());

        Self {
            repos: Repos::from_store(Arc::new(MemoryStore::new())),
            cache,
            fake,
            catalog,
        }
    }

    pub fn hades_id(&self) -> i64 {
        1001
    }

    pub fn celeste_id(&self) -> i64 {
        1002
    }

    pub fn outer_wilds_id(&self) -> i64 {
        1003
    }

    /// Creates a user directly in the store (no usable password).
    pub async fn user(&self, username: &str) -> User {
        self.repos
            .users
            .create(&format!("{username}@example.com"), username, "unusable")
            .await
            .unwrap()
    }

    pub async fn collect(&self, user_id: Uuid, rawg_id: i64, status: GameStatus) -> CollectionEntry {
        let request = AddGameRequest {
            rawg_id,
            status: Some(status),
            playtime: None,
        };
        add_game(&self.repos, &self.catalog, user_id, &request)
            .await
            .unwrap()
    }

    /// Application state over this harness. Must be called inside a runtime.
    pub fn state(&self, config: Config) -> AppState {
        let (jobs, _workers) = jobs::start(1, self.cache.clone());
        AppState {
            repos: self.repos.clone(),
            cache: self.cache.clone(),
            catalog: self.catalog.clone(),
            jobs,
            config,
            started_at: Instant::now(),
        }
    }

    pub fn app(&self) -> Router {
        build_router(self.state(Config::test_default()))
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends one request and returns the status with the decoded JSON body
/// (`Value::Null` for empty or non-JSON bodies).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Registers a user through the API and returns `(user id, token)`.
pub async fn register(app: &Router, username: &str) -> (String, String) {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": format!("{username}@example.com"),
                "username": username,
                "password": "password123",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    (
        body["user"]["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}
