//! PostgreSQL implementation of GameSessionRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use bbs_core::{
    DoorId, GameSessionRecord, GameSessionRepository, InteractionEntry, RepoResult, UserId,
};

use crate::models::GameSessionModel;

use super::map_db_error;

/// PostgreSQL implementation of GameSessionRepository
///
/// A unique index on (user_id, door_id) enforces the single active record
/// per pair.
#[derive(Clone)]
pub struct PgGameSessionRepository {
    pool: PgPool,
}

impl PgGameSessionRepository {
    /// Create a new PgGameSessionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameSessionRepository for PgGameSessionRepository {
    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn create(&self, record: &GameSessionRecord) -> RepoResult<()> {
        let history = serde_json::to_value(&record.history)
            .map_err(|e| bbs_core::DomainError::InternalError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO game_sessions (id, user_id, door_id, state, history, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&record.id)
        .bind(record.user_id.as_str())
        .bind(record.door_id.as_str())
        .bind(&record.state)
        .bind(history)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_active(
        &self,
        user_id: &UserId,
        door_id: &DoorId,
    ) -> RepoResult<Option<GameSessionRecord>> {
        let result = sqlx::query_as::<_, GameSessionModel>(
            r#"
            SELECT id, user_id, door_id, state, history, created_at, updated_at
            FROM game_sessions
            WHERE user_id = $1 AND door_id = $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(door_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(GameSessionRecord::from))
    }

    #[instrument(skip(self, state, history))]
    async fn update(
        &self,
        id: &str,
        state: &serde_json::Value,
        history: &[InteractionEntry],
    ) -> RepoResult<()> {
        let history = serde_json::to_value(history)
            .map_err(|e| bbs_core::DomainError::InternalError(e.to_string()))?;

        sqlx::query(
            r#"
            UPDATE game_sessions
            SET state = $2, history = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(state)
        .bind(history)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> RepoResult<()> {
        sqlx::query("DELETE FROM game_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_all_for_user(&self, user_id: &UserId) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM game_sessions WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
