//! Persistence layer: pool setup, migrations and the repository traits the
//! services are written against.
//!
//! `PgStore` implements every trait over one `PgPool`. Tests swap in the
//! in-memory store from `db::memory`.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::collection::{CollectionEntry, CollectionUpdate, GameStatus};
use crate::models::game::{Game, NewGame};
use crate::models::review::{Review, ReviewUpdate};
use crate::models::user::User;

pub use postgres::PgStore;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Applies pending schema migrations from `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

/// One page of a listing plus the unpaginated total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `Conflict` when the email or username is taken.
    async fn create(&self, email: &str, username: &str, password_hash: &str)
        -> Result<User, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn email_or_username_taken(&self, email: &str, username: &str)
        -> Result<bool, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
}

#[async_trait]
pub trait GameRepo: Send + Sync {
    async fn find_by_rawg_id(&self, rawg_id: i64) -> Result<Option<Game>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Game>, AppError>;
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Game>, AppError>;
    /// Fails with `Conflict` when a game with the same upstream id exists.
    async fn insert(&self, game: &NewGame) -> Result<Game, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
}

#[async_trait]
pub trait CollectionRepo: Send + Sync {
    async fn exists_for_rawg_id(&self, user_id: Uuid, rawg_id: i64) -> Result<bool, AppError>;
    async fn find(&self, user_id: Uuid, game_id: Uuid)
        -> Result<Option<CollectionEntry>, AppError>;
    /// Fails with `Conflict` when the (user, game) pair already exists.
    async fn insert(
        &self,
        user_id: Uuid,
        game_id: Uuid,
        status: GameStatus,
        playtime: Option<i32>,
    ) -> Result<CollectionEntry, AppError>;
    /// Newest first.
    async fn list(
        &self,
        user_id: Uuid,
        status: Option<GameStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<CollectionEntry>, AppError>;
    async fn update(
        &self,
        user_id: Uuid,
        game_id: Uuid,
        changes: &CollectionUpdate,
    ) -> Result<Option<CollectionEntry>, AppError>;
    /// Returns whether a row was removed.
    async fn delete(&self, user_id: Uuid, game_id: Uuid) -> Result<bool, AppError>;
    async fn list_all(&self, user_id: Uuid) -> Result<Vec<CollectionEntry>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    /// `(game_id, user_count)` ordered by count descending, ties by game id.
    async fn most_popular(&self, limit: i64) -> Result<Vec<(Uuid, i64)>, AppError>;
}

#[async_trait]
pub trait ReviewRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, AppError>;
    /// Inserts, or replaces rating and content of the caller's existing review.
    async fn upsert(
        &self,
        user_id: Uuid,
        game_id: Uuid,
        rating: f64,
        content: Option<&str>,
    ) -> Result<Review, AppError>;
    async fn update(&self, id: Uuid, changes: &ReviewUpdate) -> Result<Option<Review>, AppError>;
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
    /// Newest first, with the author attached.
    async fn list_for_game(
        &self,
        game_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Review>, AppError>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Review>, AppError>;
    async fn ratings_for_user(&self, user_id: Uuid) -> Result<Vec<f64>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
}

#[async_trait]
pub trait StorePing: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;
}

/// Repository handles carried in `AppState`.
#[derive(Clone)]
pub struct Repos {
    pub users: Arc<dyn UserRepo>,
    pub games: Arc<dyn GameRepo>,
    pub collection: Arc<dyn CollectionRepo>,
    pub reviews: Arc<dyn ReviewRepo>,
    pub health: Arc<dyn StorePing>,
}

impl Repos {
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)))
    }

    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepo + GameRepo + CollectionRepo + ReviewRepo + StorePing + 'static,
    {
        Repos {
            users: store.clone(),
            games: store.clone(),
            collection: store.clone(),
            reviews: store.clone(),
            health: store,
        }
    }
}
