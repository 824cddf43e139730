//! Notification event categories and payloads
//!
//! Events are ephemeral: produced by domain actions, fanned out to
//! subscribed connections, never persisted. Delivery is best-effort.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification event categories
///
/// These are the category names carried in the `category` field of every
/// wire-level notification message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    /// New message posted to a board
    MessageNew,
    /// A participant came online
    UserJoined,
    /// A participant went offline
    UserLeft,
    /// A door session changed state (entered, progressed, exited)
    DoorStateChanged,
    /// Operator-issued announcement
    SystemAnnouncement,
    /// Error report mirrored to streaming callers
    Error,
}

impl EventCategory {
    /// Get the string representation of the category
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MessageNew => "MESSAGE_NEW",
            Self::UserJoined => "USER_JOINED",
            Self::UserLeft => "USER_LEFT",
            Self::DoorStateChanged => "DOOR_STATE_CHANGED",
            Self::SystemAnnouncement => "SYSTEM_ANNOUNCEMENT",
            Self::Error => "ERROR",
        }
    }

    /// Parse a category from its wire name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MESSAGE_NEW" => Some(Self::MessageNew),
            "USER_JOINED" => Some(Self::UserJoined),
            "USER_LEFT" => Some(Self::UserLeft),
            "DOOR_STATE_CHANGED" => Some(Self::DoorStateChanged),
            "SYSTEM_ANNOUNCEMENT" => Some(Self::SystemAnnouncement),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    /// Payload fields that a subscription filter may match on
    ///
    /// Categories with no filterable fields are delivered to every
    /// subscriber of the category regardless of filters.
    #[must_use]
    pub const fn filterable_fields(self) -> &'static [&'static str] {
        match self {
            Self::MessageNew => &["board_id"],
            Self::DoorStateChanged => &["door_id"],
            Self::UserJoined | Self::UserLeft | Self::SystemAnnouncement | Self::Error => &[],
        }
    }

    /// Whether subscribing to this category requires a resolved user id
    #[must_use]
    pub const fn requires_authentication(self) -> bool {
        matches!(self, Self::DoorStateChanged)
    }

    /// All categories, for iteration in tests and admin surfaces
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::MessageNew,
            Self::UserJoined,
            Self::UserLeft,
            Self::DoorStateChanged,
            Self::SystemAnnouncement,
            Self::Error,
        ]
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ephemeral typed event produced by a domain action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub category: EventCategory,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    /// Create a new event stamped with the current time
    pub fn new(category: EventCategory, payload: serde_json::Value) -> Self {
        Self {
            category,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Look up a filterable payload field as a string
    ///
    /// Only fields declared by the category are visible to filters.
    #[must_use]
    pub fn filter_field(&self, field: &str) -> Option<&str> {
        if !self.category.filterable_fields().contains(&field) {
            return None;
        }
        self.payload.get(field).and_then(serde_json::Value::as_str)
    }
}
