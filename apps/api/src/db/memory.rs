//! In-memory store for tests. Mirrors the uniqueness constraints and
//! orderings of the Postgres schema.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{CollectionRepo, GameRepo, Page, ReviewRepo, StorePing, UserRepo};
use crate::errors::AppError;
use crate::models::collection::{CollectionEntry, CollectionUpdate, GameStatus};
use crate::models::game::{Game, NewGame};
use crate::models::review::{Review, ReviewUpdate};
use crate::models::user::{User, UserSummary};

struct EntryRecord {
    id: Uuid,
    user_id: Uuid,
    game_id: Uuid,
    status: GameStatus,
    playtime: Option<i32>,
    added_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    games: Vec<Game>,
    entries: Vec<EntryRecord>,
    reviews: Vec<(Review, u64)>,
    seq: u64,
}

impl Tables {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn game(&self, id: Uuid) -> Option<&Game> {
        self.games.iter().find(|g| g.id == id)
    }

    fn entry_view(&self, record: &EntryRecord) -> Option<CollectionEntry> {
        let game = self.game(record.game_id)?.clone();
        Some(CollectionEntry {
            id: record.id,
            user_id: record.user_id,
            game_id: record.game_id,
            status: record.status,
            playtime: record.playtime,
            added_at: record.added_at,
            game,
        })
    }

    /// Entries for a user, newest first.
    fn user_entries(&self, user_id: Uuid) -> Vec<&EntryRecord> {
        let mut entries: Vec<_> = self.entries.iter().filter(|e| e.user_id == user_id).collect();
        entries.sort_by(|a, b| (b.added_at, b.seq).cmp(&(a.added_at, a.seq)));
        entries
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }
}

fn paginate<T>(items: Vec<T>, limit: i64, offset: i64) -> Page<T> {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    Page { items, total }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let mut tables = self.lock();
        if tables
            .users
            .iter()
            .any(|u| u.email == email || u.username == username)
        {
            return Err(AppError::Conflict("User already exists".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn email_or_username_taken(
        &self,
        email: &str,
        username: &str,
    ) -> Result<bool, AppError> {
        Ok(self
            .lock()
            .users
            .iter()
            .any(|u| u.email == email || u.username == username))
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.lock().users.len() as i64)
    }
}

#[async_trait]
impl GameRepo for MemoryStore {
    async fn find_by_rawg_id(&self, rawg_id: i64) -> Result<Option<Game>, AppError> {
        Ok(self.lock().games.iter().find(|g| g.rawg_id == rawg_id).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Game>, AppError> {
        Ok(self.lock().game(id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Game>, AppError> {
        Ok(self
            .lock()
            .games
            .iter()
            .filter(|g| ids.contains(&g.id))
            .cloned()
            .collect())
    }

    async fn insert(&self, game: &NewGame) -> Result<Game, AppError> {
        let mut tables = self.lock();
        if tables.games.iter().any(|g| g.rawg_id == game.rawg_id) {
            return Err(AppError::Conflict("Game already exists".into()));
        }
        let record = Game {
            id: Uuid::new_v4(),
            rawg_id: game.rawg_id,
            name: game.name.clone(),
            slug: game.slug.clone(),
            description: game.description.clone(),
            released: game.released,
            rating: game.rating,
            metacritic: game.metacritic,
            image_url: game.image_url.clone(),
            genres: game.genres.clone(),
            platforms: game.platforms.clone(),
            created_at: Utc::now(),
        };
        tables.games.push(record.clone());
        Ok(record)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.lock().games.len() as i64)
    }
}

#[async_trait]
impl CollectionRepo for MemoryStore {
    async fn exists_for_rawg_id(&self, user_id: Uuid, rawg_id: i64) -> Result<bool, AppError> {
        let tables = self.lock();
        Ok(tables.entries.iter().any(|e| {
            e.user_id == user_id && tables.game(e.game_id).is_some_and(|g| g.rawg_id == rawg_id)
        }))
    }

    async fn find(
        &self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<CollectionEntry>, AppError> {
        let tables = self.lock();
        Ok(tables
            .entries
            .iter()
            .find(|e| e.user_id == user_id && e.game_id == game_id)
            .and_then(|e| tables.entry_view(e)))
    }

    async fn insert(
        &self,
        user_id: Uuid,
        game_id: Uuid,
        status: GameStatus,
        playtime: Option<i32>,
    ) -> Result<CollectionEntry, AppError> {
        let mut tables = self.lock();
        if tables
            .entries
            .iter()
            .any(|e| e.user_id == user_id && e.game_id == game_id)
        {
            return Err(AppError::Conflict("Game already in collection".into()));
        }
        let seq = tables.next_seq();
        let record = EntryRecord {
            id: Uuid::new_v4(),
            user_id,
            game_id,
            status,
            playtime,
            added_at: Utc::now(),
            seq,
        };
        let view = tables
            .entry_view(&record)
            .ok_or_else(|| AppError::NotFound(format!("Game {game_id} not found")))?;
        tables.entries.push(record);
        Ok(view)
    }

    async fn list(
        &self,
        user_id: Uuid,
        status: Option<GameStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<CollectionEntry>, AppError> {
        let tables = self.lock();
        let matching: Vec<_> = tables
            .user_entries(user_id)
            .into_iter()
            .filter(|e| status.map_or(true, |s| e.status == s))
            .filter_map(|e| tables.entry_view(e))
            .collect();
        Ok(paginate(matching, limit, offset))
    }

    async fn update(
        &self,
        user_id: Uuid,
        game_id: Uuid,
        changes: &CollectionUpdate,
    ) -> Result<Option<CollectionEntry>, AppError> {
        let mut tables = self.lock();
        let Some(index) = tables
            .entries
            .iter()
            .position(|e| e.user_id == user_id && e.game_id == game_id)
        else {
            return Ok(None);
        };
        let record = &mut tables.entries[index];
        if let Some(status) = changes.status {
            record.status = status;
        }
        if let Some(playtime) = changes.playtime {
            record.playtime = Some(playtime);
        }
        Ok(tables.entry_view(&tables.entries[index]))
    }

    async fn delete(&self, user_id: Uuid, game_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.lock();
        let before = tables.entries.len();
        tables
            .entries
            .retain(|e| !(e.user_id == user_id && e.game_id == game_id));
        Ok(tables.entries.len() < before)
    }

    async fn list_all(&self, user_id: Uuid) -> Result<Vec<CollectionEntry>, AppError> {
        let tables = self.lock();
        Ok(tables
            .user_entries(user_id)
            .into_iter()
            .filter_map(|e| tables.entry_view(e))
            .collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.lock().entries.len() as i64)
    }

    async fn most_popular(&self, limit: i64) -> Result<Vec<(Uuid, i64)>, AppError> {
        let tables = self.lock();
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for entry in &tables.entries {
            *counts.entry(entry.game_id).or_default() += 1;
        }
        let mut ranked: Vec<_> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit.max(0) as usize);
        Ok(ranked)
    }
}

#[async_trait]
impl ReviewRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        Ok(self
            .lock()
            .reviews
            .iter()
            .find(|(r, _)| r.id == id)
            .map(|(r, _)| r.clone()))
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        game_id: Uuid,
        rating: f64,
        content: Option<&str>,
    ) -> Result<Review, AppError> {
        let mut tables = self.lock();
        let now = Utc::now();
        if let Some((existing, _)) = tables
            .reviews
            .iter_mut()
            .find(|(r, _)| r.user_id == user_id && r.game_id == game_id)
        {
            existing.rating = rating;
            existing.content = content.map(str::to_string);
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let review = Review {
            id: Uuid::new_v4(),
            user_id,
            game_id,
            rating,
            content: content.map(str::to_string),
            created_at: now,
            updated_at: now,
            user: None,
            game: None,
        };
        let seq = tables.next_seq();
        tables.reviews.push((review.clone(), seq));
        Ok(review)
    }

    async fn update(&self, id: Uuid, changes: &ReviewUpdate) -> Result<Option<Review>, AppError> {
        let mut tables = self.lock();
        let Some((review, _)) = tables.reviews.iter_mut().find(|(r, _)| r.id == id) else {
            return Ok(None);
        };
        if let Some(rating) = changes.rating {
            review.rating = rating;
        }
        if let Some(content) = &changes.content {
            review.content = content.clone();
        }
        review.updated_at = Utc::now();
        Ok(Some(review.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.lock();
        let before = tables.reviews.len();
        tables.reviews.retain(|(r, _)| r.id != id);
        Ok(tables.reviews.len() < before)
    }

    async fn list_for_game(
        &self,
        game_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Review>, AppError> {
        let tables = self.lock();
        let mut matching: Vec<_> = tables
            .reviews
            .iter()
            .filter(|(r, _)| r.game_id == game_id)
            .collect();
        matching.sort_by(|a, b| (b.0.created_at, b.1).cmp(&(a.0.created_at, a.1)));
        let reviews = matching
            .into_iter()
            .map(|(r, _)| {
                let mut review = r.clone();
                review.user = tables
                    .users
                    .iter()
                    .find(|u| u.id == r.user_id)
                    .map(UserSummary::from);
                review
            })
            .collect();
        Ok(paginate(reviews, limit, offset))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Review>, AppError> {
        let tables = self.lock();
        let mut matching: Vec<_> = tables
            .reviews
            .iter()
            .filter(|(r, _)| r.user_id == user_id)
            .collect();
        matching.sort_by(|a, b| (b.0.created_at, b.1).cmp(&(a.0.created_at, a.1)));
        Ok(matching.into_iter().map(|(r, _)| r.clone()).collect())
    }

    async fn ratings_for_user(&self, user_id: Uuid) -> Result<Vec<f64>, AppError> {
        Ok(self
            .lock()
            .reviews
            .iter()
            .filter(|(r, _)| r.user_id == user_id)
            .map(|(r, _)| r.rating)
            .collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.lock().reviews.len() as i64)
    }
}

#[async_trait]
impl StorePing for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
