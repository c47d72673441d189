//! Axum route handlers for catalog search and lookup.

use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::catalog::cached::normalize_query;
use crate::errors::AppError;
use crate::extract::{ValidatedPath, ValidatedQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SearchParams {
    #[validate(length(min = 1))]
    pub q: String,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
}

/// GET /api/games/search
pub async fn handle_search(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<SearchParams>,
) -> Result<Json<Value>, AppError> {
    let query = normalize_query(&params.q);
    if query.is_empty() {
        return Err(AppError::Validation("q cannot be blank".to_string()));
    }

    let results = state
        .catalog
        .search(&query, params.page.unwrap_or(1))
        .await?;
    Ok(Json(results))
}

/// GET /api/games/:id
pub async fn handle_get_game(
    State(state): State<AppState>,
    ValidatedPath(rawg_id): ValidatedPath<i64>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.catalog.game(rawg_id).await?))
}
