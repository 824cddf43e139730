//! Session entity - one logical participant presence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::value_objects::{ConnectionId, DoorId, SessionId, UserId};

/// Session lifecycle state
///
/// `Connected → Authenticated → InMenu ⇄ InDoor`, with `Disconnected`
/// reachable from any state via explicit removal or sweep eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Transport attached, identity not yet resolved
    Connected,
    /// Identity resolved by the upstream collaborator
    Authenticated,
    /// Browsing menus / boards
    InMenu,
    /// Inside an interactive door
    InDoor,
    /// Torn down (terminal)
    Disconnected,
}

impl SessionState {
    /// Check whether the state counts as authenticated
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        !matches!(self, Self::Connected | Self::Disconnected)
    }
}

/// Data-bag key holding the id of the door a session is inside
pub const DATA_ACTIVE_DOOR: &str = "active_door";
/// Data-bag key holding the transient door game state
pub const DATA_DOOR_STATE: &str = "door_state";
/// Data-bag key holding the in-progress interaction history
pub const DATA_DOOR_HISTORY: &str = "door_history";

/// In-memory record of one participant's current state and context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Present while a streaming transport is attached; synthetic for
    /// stateless-origin sessions
    pub connection_id: Option<ConnectionId>,
    /// Absent until authenticated
    pub user_id: Option<UserId>,
    pub handle: Option<String>,
    pub state: SessionState,
    /// Current menu/context label (e.g. "main", "boards")
    pub menu_context: String,
    pub last_activity: DateTime<Utc>,
    /// Free-form per-feature flow state
    pub data: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session in the initial state
    pub fn new(connection_id: Option<ConnectionId>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            connection_id,
            user_id: None,
            handle: None,
            state: SessionState::Connected,
            menu_context: "main".to_string(),
            last_activity: now,
            data: HashMap::new(),
            created_at: now,
        }
    }

    /// Refresh the inactivity deadline
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Check whether the session owner matches
    #[must_use]
    pub fn belongs_to(&self, user_id: &UserId) -> bool {
        self.user_id.as_ref() == Some(user_id)
    }

    /// Check whether the session is currently inside the named door
    #[must_use]
    pub fn is_in_door(&self, door_id: &DoorId) -> bool {
        self.state == SessionState::InDoor && self.active_door().as_ref() == Some(door_id)
    }

    /// The door this session is inside, if any
    #[must_use]
    pub fn active_door(&self) -> Option<DoorId> {
        self.data
            .get(DATA_ACTIVE_DOOR)
            .and_then(serde_json::Value::as_str)
            .map(DoorId::from)
    }

    /// Move the session into a door
    pub fn enter_door(&mut self, door_id: &DoorId) {
        self.state = SessionState::InDoor;
        self.data.insert(
            DATA_ACTIVE_DOOR.to_string(),
            serde_json::Value::String(door_id.to_string()),
        );
        self.touch();
    }

    /// Return the session to the menu, clearing door flow state
    pub fn leave_door(&mut self) {
        self.state = SessionState::InMenu;
        self.data.remove(DATA_ACTIVE_DOOR);
        self.data.remove(DATA_DOOR_STATE);
        self.data.remove(DATA_DOOR_HISTORY);
        self.touch();
    }

    /// Inactivity duration relative to `now`
    #[must_use]
    pub fn idle_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_activity
    }

    /// Merge a partial update into the session, refreshing last-activity
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(user_id) = patch.user_id {
            self.user_id = Some(user_id);
        }
        if let Some(handle) = patch.handle {
            self.handle = Some(handle);
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(menu_context) = patch.menu_context {
            self.menu_context = menu_context;
        }
        for (key, value) in patch.data {
            self.data.insert(key, value);
        }
        self.touch();
    }
}

/// Partial session update, merged field-by-field
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub user_id: Option<UserId>,
    pub handle: Option<String>,
    pub state: Option<SessionState>,
    pub menu_context: Option<String>,
    pub data: HashMap<String, serde_json::Value>,
}

impl SessionPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn user(mut self, user_id: UserId, handle: impl Into<String>) -> Self {
        self.user_id = Some(user_id);
        self.handle = Some(handle.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: SessionState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn menu_context(mut self, context: impl Into<String>) -> Self {
        self.menu_context = Some(context.into());
        self
    }

    #[must_use]
    pub fn data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}
