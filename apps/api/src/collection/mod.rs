//! Collection service: the per-user join between users and games.
//!
//! One entry per (user, game). The duplicate pre-check is advisory; the
//! store's unique constraint is the authoritative duplicate signal.

pub mod handlers;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::catalog::CatalogCache;
use crate::db::Repos;
use crate::errors::AppError;
use crate::games::resolve_game;
use crate::models::collection::{CollectionEntry, CollectionUpdate, GameStatus};
use crate::models::pagination::Pagination;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddGameRequest {
    pub rawg_id: i64,
    pub status: Option<GameStatus>,
    #[validate(range(min = 0))]
    pub playtime: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateGameRequest {
    pub status: Option<GameStatus>,
    #[validate(range(min = 0))]
    pub playtime: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CollectionPage {
    pub games: Vec<CollectionEntry>,
    pub pagination: Pagination,
}

fn not_in_collection() -> AppError {
    AppError::NotFound("Game not in collection".to_string())
}

/// Adds a catalog game to the user's collection, storing the game on first
/// reference. Status defaults to BACKLOG; playtime stays absent unless given.
pub async fn add_game(
    repos: &Repos,
    catalog: &CatalogCache,
    user_id: Uuid,
    request: &AddGameRequest,
) -> Result<CollectionEntry, AppError> {
    if repos
        .collection
        .exists_for_rawg_id(user_id, request.rawg_id)
        .await?
    {
        return Err(AppError::Conflict("Game already in collection".to_string()));
    }

    let game = resolve_game(repos.games.as_ref(), catalog, request.rawg_id).await?;

    let entry = repos
        .collection
        .insert(
            user_id,
            game.id,
            request.status.unwrap_or_default(),
            request.playtime,
        )
        .await?;

    info!("User {user_id} added game {} to collection", game.id);
    Ok(entry)
}

pub async fn list_collection(
    repos: &Repos,
    user_id: Uuid,
    status: Option<GameStatus>,
    limit: i64,
    offset: i64,
) -> Result<CollectionPage, AppError> {
    let page = repos.collection.list(user_id, status, limit, offset).await?;
    Ok(CollectionPage {
        games: page.items,
        pagination: Pagination::new(page.total, limit, offset),
    })
}

/// Partial update; only supplied fields change.
pub async fn update_game(
    repos: &Repos,
    user_id: Uuid,
    game_id: Uuid,
    request: &UpdateGameRequest,
) -> Result<CollectionEntry, AppError> {
    let changes = CollectionUpdate {
        status: request.status,
        playtime: request.playtime,
    };
    repos
        .collection
        .update(user_id, game_id, &changes)
        .await?
        .ok_or_else(not_in_collection)
}

/// Removing an entry that does not exist is `NotFound`, including a repeat
/// removal.
pub async fn remove_game(repos: &Repos, user_id: Uuid, game_id: Uuid) -> Result<(), AppError> {
    if !repos.collection.delete(user_id, game_id).await? {
        return Err(not_in_collection());
    }
    info!("User {user_id} removed game {game_id} from collection");
    Ok(())
}
