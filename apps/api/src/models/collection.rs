use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::game::Game;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "game_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    #[default]
    Backlog,
    Playing,
    Completed,
    Dropped,
}

/// A user's tracked relationship to one game, joined with the game record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub status: GameStatus,
    pub playtime: Option<i32>,
    pub added_at: DateTime<Utc>,
    pub game: Game,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct CollectionUpdate {
    pub status: Option<GameStatus>,
    pub playtime: Option<i32>,
}

/// Flat row produced by the `user_games JOIN games` queries.
#[derive(Debug, sqlx::FromRow)]
pub struct CollectionEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub status: GameStatus,
    pub playtime: Option<i32>,
    pub added_at: DateTime<Utc>,
    pub g_rawg_id: i64,
    pub g_name: String,
    pub g_slug: String,
    pub g_description: Option<String>,
    pub g_released: Option<chrono::NaiveDate>,
    pub g_rating: Option<f64>,
    pub g_metacritic: Option<i32>,
    pub g_image_url: Option<String>,
    pub g_genres: Vec<String>,
    pub g_platforms: Vec<String>,
    pub g_created_at: DateTime<Utc>,
}

impl From<CollectionEntryRow> for CollectionEntry {
    fn from(row: CollectionEntryRow) -> Self {
        CollectionEntry {
            id: row.id,
            user_id: row.user_id,
            game_id: row.game_id,
            status: row.status,
            playtime: row.playtime,
            added_at: row.added_at,
            game: Game {
                id: row.game_id,
                rawg_id: row.g_rawg_id,
                name: row.g_name,
                slug: row.g_slug,
                description: row.g_description,
                released: row.g_released,
                rating: row.g_rating,
                metacritic: row.g_metacritic,
                image_url: row.g_image_url,
                genres: row.g_genres,
                platforms: row.g_platforms,
                created_at: row.g_created_at,
            },
        }
    }
}
