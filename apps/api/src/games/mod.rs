//! Game repository read path: local store first, upstream catalog on miss.

use tracing::{debug, info, warn};

use crate::catalog::rawg::RawgGameDetail;
use crate::catalog::CatalogCache;
use crate::db::GameRepo;
use crate::errors::AppError;
use crate::models::game::Game;

/// Returns the stored game for `rawg_id`, fetching and persisting it on first
/// reference. Stored games are never refreshed.
///
/// Concurrent first references may both miss and both insert; the unique
/// upstream id decides the winner and the loser re-reads the winner's row.
pub async fn resolve_game(
    games: &dyn GameRepo,
    catalog: &CatalogCache,
    rawg_id: i64,
) -> Result<Game, AppError> {
    if let Some(game) = games.find_by_rawg_id(rawg_id).await? {
        return Ok(game);
    }

    let payload = catalog.game(rawg_id).await.map_err(|e| {
        warn!("Catalog lookup for game {rawg_id} failed: {e}");
        AppError::NotFound("Game not found".to_string())
    })?;
    let detail: RawgGameDetail = serde_json::from_value(payload).map_err(|e| {
        warn!("Catalog payload for game {rawg_id} is unusable: {e}");
        AppError::NotFound("Game not found".to_string())
    })?;

    match games.insert(&detail.into_new_game(rawg_id)).await {
        Ok(game) => {
            info!("Stored game {} ({}) from catalog", game.name, rawg_id);
            Ok(game)
        }
        Err(AppError::Conflict(_)) => {
            debug!("Game {rawg_id} was stored concurrently; re-reading");
            games
                .find_by_rawg_id(rawg_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Game not found".to_string()))
        }
        Err(e) => Err(e),
    }
}
