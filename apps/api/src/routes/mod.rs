pub mod docs;
pub mod health;


use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::catalog::handlers as catalog;
use crate::collection::handlers as collection;
use crate::errors::AppError;
use crate::middleware::rate_limit::rate_limit;
use crate::reviews::handlers as reviews;
use crate::state::AppState;
use crate::stats::handlers as stats;

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/health/detailed", get(health::detailed_health_handler))
        .route(docs::DOCS_PATH, get(docs::docs_handler))
        // Auth
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/me", get(auth::handle_me))
        // Catalog
        .route("/api/games/search", get(catalog::handle_search))
        .route("/api/games/:id", get(catalog::handle_get_game))
        // Collection
        .route(
            "/api/collection",
            get(collection::handle_list).post(collection::handle_add),
        )
        .route(
            "/api/collection/:game_id",
            patch(collection::handle_update).delete(collection::handle_remove),
        )
        // Reviews
        .route("/api/reviews", post(reviews::handle_submit))
        .route("/api/reviews/me", get(reviews::handle_list_mine))
        .route(
            "/api/reviews/game/:game_id",
            get(reviews::handle_list_for_game),
        )
        .route(
            "/api/reviews/:review_id",
            patch(reviews::handle_update).delete(reviews::handle_delete),
        )
        // Stats
        .route("/api/stats/me", get(stats::handle_user_stats))
        .route("/api/stats/global", get(stats::handle_global_stats))
        .fallback(route_not_found)
        // Also wraps the fallback, so unknown paths are counted by URI path.
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .with_state(state)
}
