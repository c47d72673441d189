use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{CollectionRepo, GameRepo, Page, ReviewRepo, StorePing, UserRepo};
use crate::errors::AppError;
use crate::models::collection::{CollectionEntry, CollectionEntryRow, CollectionUpdate, GameStatus};
use crate::models::game::{Game, NewGame};
use crate::models::review::{Review, ReviewAuthorRow, ReviewUpdate};
use crate::models::user::User;

/// Columns selected for `CollectionEntryRow`. Expects `ug` and `g` aliases.
const ENTRY_COLUMNS: &str = r#"
    ug.id, ug.user_id, ug.game_id, ug.status, ug.playtime, ug.added_at,
    g.rawg_id AS g_rawg_id, g.name AS g_name, g.slug AS g_slug,
    g.description AS g_description, g.released AS g_released, g.rating AS g_rating,
    g.metacritic AS g_metacritic, g.image_url AS g_image_url, g.genres AS g_genres,
    g.platforms AS g_platforms, g.created_at AS g_created_at
"#;

/// PostgreSQL-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgStore {
    async fn create(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, username, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, "User already exists"))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn email_or_username_taken(
        &self,
        email: &str,
        username: &str,
    ) -> Result<bool, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR username = $2)",
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[async_trait]
impl GameRepo for PgStore {
    async fn find_by_rawg_id(&self, rawg_id: i64) -> Result<Option<Game>, AppError> {
        Ok(sqlx::query_as::<_, Game>("SELECT * FROM games WHERE rawg_id = $1")
            .bind(rawg_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Game>, AppError> {
        Ok(sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Game>, AppError> {
        Ok(sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert(&self, game: &NewGame) -> Result<Game, AppError> {
        sqlx::query_as::<_, Game>(
            r#"
            INSERT INTO games
                (rawg_id, name, slug, description, released, rating,
                 metacritic, image_url, genres, platforms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(game.rawg_id)
        .bind(&game.name)
        .bind(&game.slug)
        .bind(&game.description)
        .bind(game.released)
        .bind(game.rating)
        .bind(game.metacritic)
        .bind(&game.image_url)
        .bind(&game.genres)
        .bind(&game.platforms)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, "Game already exists"))
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM games")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[async_trait]
impl CollectionRepo for PgStore {
    async fn exists_for_rawg_id(&self, user_id: Uuid, rawg_id: i64) -> Result<bool, AppError> {
        Ok(sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM user_games ug
                JOIN games g ON g.id = ug.game_id
                WHERE ug.user_id = $1 AND g.rawg_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(rawg_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find(
        &self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> Result<Option<CollectionEntry>, AppError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM user_games ug JOIN games g ON g.id = ug.game_id \
             WHERE ug.user_id = $1 AND ug.game_id = $2"
        );
        let row = sqlx::query_as::<_, CollectionEntryRow>(&sql)
            .bind(user_id)
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CollectionEntry::from))
    }

    async fn insert(
        &self,
        user_id: Uuid,
        game_id: Uuid,
        status: GameStatus,
        playtime: Option<i32>,
    ) -> Result<CollectionEntry, AppError> {
        let sql = format!(
            "WITH ug AS ( \
                INSERT INTO user_games (user_id, game_id, status, playtime) \
                VALUES ($1, $2, $3, $4) RETURNING * \
             ) \
             SELECT {ENTRY_COLUMNS} FROM ug JOIN games g ON g.id = ug.game_id"
        );
        let row = sqlx::query_as::<_, CollectionEntryRow>(&sql)
            .bind(user_id)
            .bind(game_id)
            .bind(status)
            .bind(playtime)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_insert(e, "Game already in collection"))?;
        Ok(row.into())
    }

    async fn list(
        &self,
        user_id: Uuid,
        status: Option<GameStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<CollectionEntry>, AppError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM user_games ug JOIN games g ON g.id = ug.game_id \
             WHERE ug.user_id = $1 AND ($2::game_status IS NULL OR ug.status = $2) \
             ORDER BY ug.added_at DESC \
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, CollectionEntryRow>(&sql)
            .bind(user_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_games \
             WHERE user_id = $1 AND ($2::game_status IS NULL OR status = $2)",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page {
            items: rows.into_iter().map(CollectionEntry::from).collect(),
            total,
        })
    }

    async fn update(
        &self,
        user_id: Uuid,
        game_id: Uuid,
        changes: &CollectionUpdate,
    ) -> Result<Option<CollectionEntry>, AppError> {
        let sql = format!(
            "WITH ug AS ( \
                UPDATE user_games \
                SET status = COALESCE($3, status), playtime = COALESCE($4, playtime) \
                WHERE user_id = $1 AND game_id = $2 \
                RETURNING * \
             ) \
             SELECT {ENTRY_COLUMNS} FROM ug JOIN games g ON g.id = ug.game_id"
        );
        let row = sqlx::query_as::<_, CollectionEntryRow>(&sql)
            .bind(user_id)
            .bind(game_id)
            .bind(changes.status)
            .bind(changes.playtime)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CollectionEntry::from))
    }

    async fn delete(&self, user_id: Uuid, game_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM user_games WHERE user_id = $1 AND game_id = $2")
            .bind(user_id)
            .bind(game_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self, user_id: Uuid) -> Result<Vec<CollectionEntry>, AppError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM user_games ug JOIN games g ON g.id = ug.game_id \
             WHERE ug.user_id = $1 ORDER BY ug.added_at DESC"
        );
        let rows = sqlx::query_as::<_, CollectionEntryRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CollectionEntry::from).collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM user_games")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn most_popular(&self, limit: i64) -> Result<Vec<(Uuid, i64)>, AppError> {
        Ok(sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT game_id, COUNT(*) AS user_count
            FROM user_games
            GROUP BY game_id
            ORDER BY user_count DESC, game_id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl ReviewRepo for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        Ok(sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        game_id: Uuid,
        rating: f64,
        content: Option<&str>,
    ) -> Result<Review, AppError> {
        Ok(sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (user_id, game_id, rating, content)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, game_id)
            DO UPDATE SET rating = EXCLUDED.rating,
                          content = EXCLUDED.content,
                          updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(game_id)
        .bind(rating)
        .bind(content)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update(&self, id: Uuid, changes: &ReviewUpdate) -> Result<Option<Review>, AppError> {
        let (set_content, content) = match &changes.content {
            Some(content) => (true, content.as_deref()),
            None => (false, None),
        };
        Ok(sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET rating = COALESCE($2, rating),
                content = CASE WHEN $3 THEN $4 ELSE content END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.rating)
        .bind(set_content)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_game(
        &self,
        game_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Review>, AppError> {
        let rows = sqlx::query_as::<_, ReviewAuthorRow>(
            r#"
            SELECT r.*, u.username
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.game_id = $1
            ORDER BY r.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(game_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE game_id = $1")
            .bind(game_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Page {
            items: rows.into_iter().map(Review::from).collect(),
            total,
        })
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Review>, AppError> {
        Ok(sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn ratings_for_user(&self, user_id: Uuid) -> Result<Vec<f64>, AppError> {
        Ok(sqlx::query_scalar("SELECT rating FROM reviews WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[async_trait]
impl StorePing for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
