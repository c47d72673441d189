//! Review service. One review per (user, game); submitting again replaces
//! the earlier rating and text. Only owners of the game may review it, and
//! only the author may edit or delete a review.

pub mod handlers;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::db::Repos;
use crate::errors::AppError;
use crate::models::pagination::Pagination;
use crate::models::review::{normalize_content, Review, ReviewUpdate};
use crate::models::user::UserSummary;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    pub game_id: Uuid,
    #[validate(range(min = 1.0, max = 10.0))]
    pub rating: f64,
    #[validate(length(max = 2000))]
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(range(min = 1.0, max = 10.0))]
    pub rating: Option<f64>,
    #[validate(length(max = 2000))]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub pagination: Pagination,
}

fn review_not_found() -> AppError {
    AppError::NotFound("Review not found".to_string())
}

/// Attaches the author summary and full game record.
async fn with_author_and_game(repos: &Repos, mut review: Review) -> Result<Review, AppError> {
    review.user = repos
        .users
        .find_by_id(review.user_id)
        .await?
        .as_ref()
        .map(UserSummary::from);
    review.game = repos.games.find_by_id(review.game_id).await?;
    Ok(review)
}

/// Loads a review and checks the caller wrote it.
async fn owned_review(repos: &Repos, user_id: Uuid, review_id: Uuid) -> Result<Review, AppError> {
    let review = repos
        .reviews
        .find_by_id(review_id)
        .await?
        .ok_or_else(review_not_found)?;
    if review.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(review)
}

/// Creates the caller's review of a game, or replaces it if one exists.
pub async fn submit_review(
    repos: &Repos,
    user_id: Uuid,
    request: &SubmitReviewRequest,
) -> Result<Review, AppError> {
    let game = repos
        .games
        .find_by_id(request.game_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

    if repos.collection.find(user_id, game.id).await?.is_none() {
        return Err(AppError::InvalidPrecondition(
            "Add this game to your collection before reviewing it".to_string(),
        ));
    }

    let content = normalize_content(request.content.clone());
    let review = repos
        .reviews
        .upsert(user_id, game.id, request.rating, content.as_deref())
        .await?;

    info!("User {user_id} reviewed game {} ({})", game.id, review.rating);
    with_author_and_game(repos, review).await
}

pub async fn update_review(
    repos: &Repos,
    user_id: Uuid,
    review_id: Uuid,
    request: &UpdateReviewRequest,
) -> Result<Review, AppError> {
    owned_review(repos, user_id, review_id).await?;

    let changes = ReviewUpdate {
        rating: request.rating,
        content: request
            .content
            .clone()
            .map(|content| normalize_content(Some(content))),
    };
    let review = repos
        .reviews
        .update(review_id, &changes)
        .await?
        .ok_or_else(review_not_found)?;

    with_author_and_game(repos, review).await
}

pub async fn delete_review(repos: &Repos, user_id: Uuid, review_id: Uuid) -> Result<(), AppError> {
    owned_review(repos, user_id, review_id).await?;
    if !repos.reviews.delete(review_id).await? {
        return Err(review_not_found());
    }
    info!("User {user_id} deleted review {review_id}");
    Ok(())
}

pub async fn list_reviews_for_game(
    repos: &Repos,
    game_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<ReviewPage, AppError> {
    let page = repos.reviews.list_for_game(game_id, limit, offset).await?;
    Ok(ReviewPage {
        reviews: page.items,
        pagination: Pagination::new(page.total, limit, offset),
    })
}

/// The caller's reviews, newest first, each with its game attached.
pub async fn list_user_reviews(repos: &Repos, user_id: Uuid) -> Result<Vec<Review>, AppError> {
    let mut reviews = repos.reviews.list_for_user(user_id).await?;
    let game_ids: Vec<Uuid> = reviews.iter().map(|r| r.game_id).collect();
    let games: HashMap<Uuid, _> = repos
        .games
        .find_many(&game_ids)
        .await?
        .into_iter()
        .map(|g| (g.id, g))
        .collect();
    for review in &mut reviews {
        review.game = games.get(&review.game_id).cloned();
    }
    Ok(reviews)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::collection::GameStatus;
    use crate::test_support::TestHarness;

    fn submit(game_id: Uuid, rating: f64, content: Option<&str>) -> SubmitReviewRequest {
        SubmitReviewRequest {
            game_id,
            rating,
            content: content.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_resubmission_replaces_review() {
        let h = TestHarness::new();
        let user = h.user("ada").await;
        let entry = h.collect(user.id, h.hades_id(), GameStatus::Completed).await;

        let first = submit_review(&h.repos, user.id, &submit(entry.game_id, 7.0, Some("Good")))
            .await
            .unwrap();
        let second = submit_review(&h.repos, user.id, &submit(entry.game_id, 9.5, Some("")))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.rating, 9.5);
        assert_eq!(second.content, None);
        assert_eq!(second.user.as_ref().unwrap().username, "ada");
        assert_eq!(second.game.as_ref().unwrap().name, "Hades");
        assert_eq!(h.repos.reviews.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_review_requires_owning_the_game() {
        let h = TestHarness::new();
        let ada = h.user("ada").await;
        let bob = h.user("bob").await;
        let entry = h.collect(ada.id, h.hades_id(), GameStatus::Playing).await;

        let err = submit_review(&h.repos, bob.id, &submit(entry.game_id, 8.0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPrecondition(_)));
    }

    #[tokio::test]
    async fn test_review_of_unknown_game_is_not_found() {
        let h = TestHarness::new();
        let user = h.user("ada").await;
        let err = submit_review(&h.repos, user.id, &submit(Uuid::new_v4(), 8.0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_only_author_may_edit_or_delete() {
        let h = TestHarness::new();
        let ada = h.user("ada").await;
        let bob = h.user("bob").await;
        let entry = h.collect(ada.id, h.hades_id(), GameStatus::Playing).await;
        let review = submit_review(&h.repos, ada.id, &submit(entry.game_id, 6.0, None))
            .await
            .unwrap();

        let err = update_review(&h.repos, bob.id, review.id, &UpdateReviewRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        let err = delete_review(&h.repos, bob.id, review.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        delete_review(&h.repos, ada.id, review.id).await.unwrap();
        let err = delete_review(&h.repos, ada.id, review.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_partial_update_keeps_unsupplied_fields() {
        let h = TestHarness::new();
        let user = h.user("ada").await;
        let entry = h.collect(user.id, h.hades_id(), GameStatus::Playing).await;
        let review = submit_review(&h.repos, user.id, &submit(entry.game_id, 6.0, Some("Fine")))
            .await
            .unwrap();

        let updated = update_review(
            &h.repos,
            user.id,
            review.id,
            &UpdateReviewRequest {
                rating: Some(8.0),
                content: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.rating, 8.0);
        assert_eq!(updated.content.as_deref(), Some("Fine"));

        let cleared = update_review(
            &h.repos,
            user.id,
            review.id,
            &UpdateReviewRequest {
                rating: None,
                content: Some(String::new()),
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.rating, 8.0);
        assert_eq!(cleared.content, None);
    }

    #[tokio::test]
    async fn test_user_reviews_carry_games() {
        let h = TestHarness::new();
        let user = h.user("ada").await;
        let hades = h.collect(user.id, h.hades_id(), GameStatus::Playing).await;
        let celeste = h.collect(user.id, h.celeste_id(), GameStatus::Playing).await;
        submit_review(&h.repos, user.id, &submit(hades.game_id, 9.0, None))
            .await
            .unwrap();
        submit_review(&h.repos, user.id, &submit(celeste.game_id, 7.0, None))
            .await
            .unwrap();

        let reviews = list_user_reviews(&h.repos, user.id).await.unwrap();
        let names: Vec<_> = reviews
            .iter()
            .map(|r| r.game.as_ref().unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["Celeste", "Hades"]);
    }

    #[test]
    fn test_rating_bounds_and_content_length_validated() {
        assert!(submit(Uuid::new_v4(), 0.5, None).validate().is_err());
        assert!(submit(Uuid::new_v4(), 10.5, None).validate().is_err());
        assert!(submit(Uuid::new_v4(), 1.0, None).validate().is_ok());
        assert!(submit(Uuid::new_v4(), 10.0, None).validate().is_ok());

        let long = "x".repeat(2001);
        assert!(submit(Uuid::new_v4(), 5.0, Some(&long)).validate().is_err());
        let max = "é".repeat(2000);
        assert!(submit(Uuid::new_v4(), 5.0, Some(&max)).validate().is_ok());
    }
}
