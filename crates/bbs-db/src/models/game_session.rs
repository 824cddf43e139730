//! Game session database model

use bbs_core::{DoorId, GameSessionRecord, InteractionEntry, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the game_sessions table
///
/// State and history are JSONB columns; the blob is opaque to the store.
#[derive(Debug, Clone, FromRow)]
pub struct GameSessionModel {
    pub id: String,
    pub user_id: String,
    pub door_id: String,
    pub state: serde_json::Value,
    pub history: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GameSessionModel> for GameSessionRecord {
    fn from(model: GameSessionModel) -> Self {
        // malformed history degrades to empty
        let history: Vec<InteractionEntry> =
            serde_json::from_value(model.history).unwrap_or_default();

        Self {
            id: model.id,
            user_id: UserId::new(model.user_id),
            door_id: DoorId::new(model.door_id),
            state: model.state,
            history,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
