use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Canonical catalog record, persisted once per upstream id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: Uuid,
    pub rawg_id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub released: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub metacritic: Option<i32>,
    pub image_url: Option<String>,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a game; ids and timestamps come from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
    pub rawg_id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub released: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub metacritic: Option<i32>,
    pub image_url: Option<String>,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
}
