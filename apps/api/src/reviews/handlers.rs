//! Axum route handlers for reviews.

use axum::{
    extract::State,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::jobs::{CacheTarget, Job};
use crate::models::pagination::PageParams;
use crate::models::review::Review;
use crate::reviews::{
    delete_review, list_reviews_for_game, list_user_reviews, submit_review, update_review,
    ReviewPage, SubmitReviewRequest, UpdateReviewRequest,
};
use crate::state::AppState;

fn refresh_stats(state: &AppState, user_id: Uuid) {
    state.jobs.enqueue(Job::RefreshCache {
        target: CacheTarget::UserStats(user_id),
    });
}

/// GET /api/reviews/game/:gameId
pub async fn handle_list_for_game(
    State(state): State<AppState>,
    ValidatedPath(game_id): ValidatedPath<Uuid>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> Result<Json<ReviewPage>, AppError> {
    let reviews =
        list_reviews_for_game(&state.repos, game_id, page.limit(), page.offset()).await?;
    Ok(Json(reviews))
}

/// GET /api/reviews/me
pub async fn handle_list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let reviews = list_user_reviews(&state.repos, auth.user_id).await?;
    Ok(Json(json!({ "reviews": reviews })))
}

/// POST /api/reviews
pub async fn handle_submit(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<SubmitReviewRequest>,
) -> Result<Json<Review>, AppError> {
    let review = submit_review(&state.repos, auth.user_id, &request).await?;
    refresh_stats(&state, auth.user_id);
    Ok(Json(review))
}

/// PATCH /api/reviews/:reviewId
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(review_id): ValidatedPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateReviewRequest>,
) -> Result<Json<Review>, AppError> {
    let review = update_review(&state.repos, auth.user_id, review_id, &request).await?;
    refresh_stats(&state, auth.user_id);
    Ok(Json(review))
}

/// DELETE /api/reviews/:reviewId
pub async fn handle_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedPath(review_id): ValidatedPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    delete_review(&state.repos, auth.user_id, review_id).await?;
    refresh_stats(&state, auth.user_id);
    Ok(Json(json!({ "success": true })))
}
