//! Axum route handlers for the caller's collection.

use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::collection::{
    add_game, list_collection, remove_game, update_game, AddGameRequest, CollectionPage,
    UpdateGameRequest,
};
use crate::errors::AppError;
use crate::extract::{ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::jobs::{CacheTarget, Job};
use crate::models::collection::{CollectionEntry, GameStatus};
use crate::models::pagination::DEFAULT_LIMIT;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CollectionQuery {
    pub status: Option<GameStatus>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

fn refresh_stats(state: &AppState, user_id: Uuid) {
    state.jobs.enqueue(Job::RefreshCache {
        target: CacheTarget::UserStats(user_id),
    });
}

/// GET /api/collection
pub async fn handle_list(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<CollectionQuery>,
) -> Result<Json<CollectionPage>, AppError> {
    let page = list_collection(
        &state.repos,
        auth.user_id,
        query.status,
        query.limit.unwrap_or(DEFAULT_LIMIT),
        query.offset.unwrap_or(0),
    )
    .await?;
    Ok(Json(page))
}

/// POST /api/collection
pub async fn handle_add(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<AddGameRequest>,
) -> Result<Json<CollectionEntry>, AppError> {
    let entry = add_game(&state.repos, &state.catalog, auth.user_id, &request).await?;
    refresh_stats(&state, auth.user_id);
    Ok(Json(entry))
}

/// PATCH /api/collection/:gameId
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(game_id): ValidatedPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateGameRequest>,
) -> Result<Json<CollectionEntry>, AppError> {
    let entry = update_game(&state.repos, auth.user_id, game_id, &request).await?;
    refresh_stats(&state, auth.user_id);
    Ok(Json(entry))
}

/// DELETE /api/collection/:gameId
pub async fn handle_remove(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(game_id): ValidatedPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    remove_game(&state.repos, auth.user_id, game_id).await?;
    refresh_stats(&state, auth.user_id);
    Ok(Json(json!({ "success": true })))
}
