//! Stats aggregator. Snapshots are derived from collection and review rows
//! on demand and cached briefly; mutations evict the caller's snapshot via
//! a background `RefreshCache` job.

pub mod handlers;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::{get_json, put_json, CacheStore};
use crate::db::Repos;
use crate::errors::AppError;
use crate::models::collection::{CollectionEntry, GameStatus};
use crate::models::game::Game;

pub const GLOBAL_STATS_KEY: &str = "stats:global";
pub const USER_STATS_TTL_SECS: u64 = 10;
pub const GLOBAL_STATS_TTL_SECS: u64 = 600;

const TOP_GENRES: usize = 5;
const POPULAR_GAMES: i64 = 10;

pub fn user_stats_key(user_id: Uuid) -> String {
    format!("stats:{user_id}")
}

/// Entries per status. Every status is always present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StatusCount {
    pub backlog: i64,
    pub playing: i64,
    pub completed: i64,
    pub dropped: i64,
}

impl StatusCount {
    fn bump(&mut self, status: GameStatus) {
        match status {
            GameStatus::Backlog => self.backlog += 1,
            GameStatus::Playing => self.playing += 1,
            GameStatus::Completed => self.completed += 1,
            GameStatus::Dropped => self.dropped += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreCount {
    pub genre: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_games: i64,
    pub total_playtime: i64,
    pub status_count: StatusCount,
    pub top_genres: Vec<GenreCount>,
    pub total_reviews: i64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopularGame {
    pub game: Game,
    pub user_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_users: i64,
    pub total_games: i64,
    pub total_reviews: i64,
    pub total_collections: i64,
    pub popular_games: Vec<PopularGame>,
}

/// Genre frequencies, most frequent first. Equal counts keep the order in
/// which the genre was first seen.
pub fn top_genres(entries: &[CollectionEntry], limit: usize) -> Vec<GenreCount> {
    let mut counts: Vec<GenreCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for genre in entries.iter().flat_map(|e| e.game.genres.iter()) {
        match index.get(genre.as_str()) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(genre, counts.len());
                counts.push(GenreCount {
                    genre: genre.clone(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort keeps first-seen order among ties.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// Mean rounded to one decimal place; 0 for no ratings.
pub fn average_rating(ratings: &[f64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

pub fn summarize(entries: &[CollectionEntry], ratings: &[f64]) -> UserStats {
    let mut status_count = StatusCount::default();
    for entry in entries {
        status_count.bump(entry.status);
    }

    UserStats {
        total_games: entries.len() as i64,
        total_playtime: entries
            .iter()
            .map(|e| i64::from(e.playtime.unwrap_or(0)))
            .sum(),
        status_count,
        top_genres: top_genres(entries, TOP_GENRES),
        total_reviews: ratings.len() as i64,
        average_rating: average_rating(ratings),
    }
}

pub async fn user_stats(
    repos: &Repos,
    cache: &dyn CacheStore,
    user_id: Uuid,
) -> Result<UserStats, AppError> {
    let key = user_stats_key(user_id);
    if let Some(stats) = get_json::<UserStats>(cache, &key).await {
        return Ok(stats);
    }

    let entries = repos.collection.list_all(user_id).await?;
    let ratings = repos.reviews.ratings_for_user(user_id).await?;
    let stats = summarize(&entries, &ratings);

    put_json(cache, &key, &stats, USER_STATS_TTL_SECS).await;
    Ok(stats)
}

pub async fn global_stats(repos: &Repos, cache: &dyn CacheStore) -> Result<GlobalStats, AppError> {
    if let Some(stats) = get_json::<GlobalStats>(cache, GLOBAL_STATS_KEY).await {
        return Ok(stats);
    }

    let (total_users, total_games, total_reviews, total_collections) = tokio::try_join!(
        repos.users.count(),
        repos.games.count(),
        repos.reviews.count(),
        repos.collection.count(),
    )?;

    let popular = repos.collection.most_popular(POPULAR_GAMES).await?;
    let ids: Vec<Uuid> = popular.iter().map(|(id, _)| *id).collect();
    let mut games: HashMap<Uuid, Game> = repos
        .games
        .find_many(&ids)
        .await?
        .into_iter()
        .map(|g| (g.id, g))
        .collect();
    let popular_games = popular
        .into_iter()
        .filter_map(|(id, user_count)| {
            games
                .remove(&id)
                .map(|game| PopularGame { game, user_count })
        })
        .collect();

    let stats = GlobalStats {
        total_users,
        total_games,
        total_reviews,
        total_collections,
        popular_games,
    };
    put_json(cache, GLOBAL_STATS_KEY, &stats, GLOBAL_STATS_TTL_SECS).await;
    Ok(stats)
}
