//! Axum route handlers for registration, login and the current account.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::auth::{issue_token, password, AuthUser};
use crate::errors::AppError;
use crate::extract::ValidatedJson;
use crate::jobs::{CacheTarget, Job};
use crate::models::user::User;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 20))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if state
        .repos
        .users
        .email_or_username_taken(&request.email, &request.username)
        .await?
    {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = password::hash(request.password).await?;
    let user = state
        .repos
        .users
        .create(&request.email, &request.username, &password_hash)
        .await?;
    info!("User registered: {} ({})", user.username, user.id);

    state
        .jobs
        .enqueue(Job::welcome_email(&user.email, &user.username));
    state.jobs.enqueue(Job::RefreshCache {
        target: CacheTarget::GlobalStats,
    });

    let token = issue_token(user.id, &state.config.jwt_secret, state.config.token_ttl_hours)?;
    Ok(Json(AuthResponse { user, token }))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state.repos.users.find_by_email(&request.email).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());

    let matched = password::verify(request.password, stored_hash).await?;
    let user = match user {
        Some(user) if matched => user,
        _ => return Err(AppError::InvalidCredentials),
    };

    let token = issue_token(user.id, &state.config.jwt_secret, state.config.token_ttl_hours)?;
    Ok(Json(AuthResponse { user, token }))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = state
        .repos
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(serde_json::json!({ "user": user })))
}
