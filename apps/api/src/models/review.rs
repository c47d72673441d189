use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::game::Game;
use crate::models::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub rating: f64,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<Game>,
}

/// Partial update. `content: Some(None)` clears the text.
#[derive(Debug, Clone, Default)]
pub struct ReviewUpdate {
    pub rating: Option<f64>,
    pub content: Option<Option<String>>,
}

/// Review joined with its author's username.
#[derive(Debug, FromRow)]
pub struct ReviewAuthorRow {
    #[sqlx(flatten)]
    pub review: Review,
    pub username: String,
}

impl From<ReviewAuthorRow> for Review {
    fn from(row: ReviewAuthorRow) -> Self {
        let mut review = row.review;
        review.user = Some(UserSummary {
            id: review.user_id,
            username: row.username,
        });
        review
    }
}

/// Normalizes submitted review text: blank content is stored as absent.
pub fn normalize_content(content: Option<String>) -> Option<String> {
    content.filter(|c| !c.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_becomes_none() {
        assert_eq!(normalize_content(Some(String::new())), None);
        assert_eq!(normalize_content(Some("   ".into())), None);
        assert_eq!(normalize_content(None), None);
    }

    #[test]
    fn test_content_kept_verbatim() {
        assert_eq!(
            normalize_content(Some(" Great game ".into())),
            Some(" Great game ".into())
        );
    }
}
