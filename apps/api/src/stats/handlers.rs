use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;
use crate::stats::{global_stats, user_stats, GlobalStats, UserStats};

/// GET /api/stats/me
pub async fn handle_user_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserStats>, AppError> {
    Ok(Json(
        user_stats(&state.repos, state.cache.as_ref(), auth.user_id).await?,
    ))
}

/// GET /api/stats/global
pub async fn handle_global_stats(
    State(state): State<AppState>,
) -> Result<Json<GlobalStats>, AppError> {
    Ok(Json(global_stats(&state.repos, state.cache.as_ref()).await?))
}
