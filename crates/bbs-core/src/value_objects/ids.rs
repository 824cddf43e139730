//! Opaque string identifiers
//!
//! All ids in this system are opaque strings: session and connection ids are
//! UUIDs minted by this process, user and door ids arrive from collaborators.
//! Newtypes keep them from being swapped at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing id value
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// View the id as a string slice
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the id, returning the inner string
            #[inline]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identity of one logical participant presence
    SessionId
}

string_id! {
    /// Identity of an authenticated participant, resolved upstream
    UserId
}

string_id! {
    /// Identity of a registered door (interactive activity)
    DoorId
}

string_id! {
    /// Identity of an attached transport connection (or a synthetic stateless bridge)
    ConnectionId
}

impl SessionId {
    /// Mint a fresh session id
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl ConnectionId {
    /// Mint a fresh connection id
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Synthetic connection id for stateless callers
    ///
    /// Deterministic per (user, door) so independent stateless requests
    /// resolve to the same live session.
    #[must_use]
    pub fn stateless(user_id: &UserId, door_id: &DoorId) -> Self {
        Self(format!("stateless:{user_id}:{door_id}"))
    }

    /// Whether this id was synthesized for a stateless caller
    #[must_use]
    pub fn is_stateless(&self) -> bool {
        self.0.starts_with("stateless:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
        assert_ne!(ConnectionId::generate(), ConnectionId::generate());
    }

    #[test]
    fn test_stateless_connection_id_is_deterministic() {
        let user = UserId::new("alice");
        let door = DoorId::new("oracle");

        let a = ConnectionId::stateless(&user, &door);
        let b = ConnectionId::stateless(&user, &door);

        assert_eq!(a, b);
        assert!(a.is_stateless());
        assert_eq!(a.as_str(), "stateless:alice:oracle");
    }

    #[test]
    fn test_streaming_id_is_not_stateless() {
        assert!(!ConnectionId::generate().is_stateless());
    }

    #[test]
    fn test_serde_transparent() {
        let id = DoorId::new("hilo");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"hilo\"");

        let back: DoorId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
