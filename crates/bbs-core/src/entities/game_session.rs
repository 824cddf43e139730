//! GameSessionRecord entity - durable snapshot of one user's door progress

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{DoorId, UserId};

/// One accepted interaction inside a door
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEntry {
    pub input: String,
    pub output: String,
    pub timestamp: DateTime<Utc>,
}

impl InteractionEntry {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Persisted snapshot of one user's progress in one door
///
/// At most one active record exists per `(user_id, door_id)` pair. The state
/// blob is opaque to everything except the owning door.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSessionRecord {
    pub id: String,
    pub user_id: UserId,
    pub door_id: DoorId,
    pub state: serde_json::Value,
    pub history: Vec<InteractionEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameSessionRecord {
    /// Create a fresh record with empty state and history
    pub fn new(user_id: UserId, door_id: DoorId) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            door_id,
            state: serde_json::Value::Null,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the snapshot after an accepted input
    pub fn checkpoint(&mut self, state: serde_json::Value, history: Vec<InteractionEntry>) {
        self.state = state;
        self.history = history;
        self.updated_at = Utc::now();
    }

    /// Whether the record holds any progress worth resuming
    #[must_use]
    pub fn has_progress(&self) -> bool {
        !self.history.is_empty() || !self.state.is_null()
    }
}
