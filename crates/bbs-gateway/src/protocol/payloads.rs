//! Payload definitions
//!
//! Defines the payload structures carried in the `d` field of gateway messages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    /// Default heartbeat interval (45 seconds)
    pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 45_000;

    /// Create a new Hello payload with default interval
    #[must_use]
    pub fn new() -> Self {
        Self {
            heartbeat_interval: Self::DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    /// Create a Hello payload with custom interval
    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }
}

impl Default for HelloPayload {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload for op 2 (Identify)
///
/// Carries the identity resolved by the upstream collaborator. The gateway
/// trusts it; no credential check happens here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Upstream-resolved user id
    pub user_id: String,

    /// Display handle
    pub handle: String,

    /// Optional access level label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<String>,
}

impl IdentifyPayload {
    /// Whether the payload carries a usable identity
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.handle.trim().is_empty()
    }
}

/// Dispatch payload for the READY event sent after a successful Identify
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyPayload {
    /// Protocol version
    pub v: u8,
    /// Registry session id bound to this connection
    pub session_id: String,
    /// Echo of the resolved identity
    pub user_id: String,
    pub handle: String,
}

/// Payload for op 3 (Subscribe)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribePayload {
    /// Category wire names to subscribe to
    pub event_types: Vec<String>,

    /// Optional exact-match filters applied to every listed category
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub filters: HashMap<String, String>,
}

/// Payload for op 4 (Unsubscribe)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribePayload {
    /// Category wire names to drop
    pub event_types: Vec<String>,
}
