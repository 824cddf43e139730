//! Gateway message format
//!
//! Defines the structure for all WebSocket messages.

use super::{CloseCode, HelloPayload, IdentifyPayload, OpCode, SubscribePayload, UnsubscribePayload};
use bbs_core::NotificationEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event type name used for coalesced dispatch frames
pub const BATCH_EVENT_TYPE: &str = "NOTIFICATION_BATCH";

/// Gateway message format
///
/// All messages sent over the WebSocket connection follow this format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Operation code
    pub op: OpCode,

    /// Event type (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Sequence number (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event data payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayMessage {
    // === Server Messages ===

    /// Create a Dispatch message (op=0)
    #[must_use]
    pub fn dispatch(event_type: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event_type.into()),
            s: Some(sequence),
            d: Some(data),
        }
    }

    /// Create a Dispatch for a single notification event
    ///
    /// `t` carries the category wire name, `d` the `{category, payload,
    /// timestamp}` object.
    #[must_use]
    pub fn dispatch_event(sequence: u64, event: &NotificationEvent) -> Self {
        Self::dispatch(
            event.category.as_str(),
            sequence,
            serde_json::to_value(event).unwrap_or_default(),
        )
    }

    /// Create a Dispatch carrying a coalesced batch of notification events
    ///
    /// `d` is an array of `{category, payload, timestamp}` objects in
    /// emission order.
    #[must_use]
    pub fn dispatch_batch(sequence: u64, events: &[NotificationEvent]) -> Self {
        Self::dispatch(
            BATCH_EVENT_TYPE,
            sequence,
            serde_json::to_value(events).unwrap_or_default(),
        )
    }

    /// Create a Hello message (op=10)
    #[must_use]
    pub fn hello(payload: HelloPayload) -> Self {
        Self {
            op: OpCode::Hello,
            t: None,
            s: None,
            d: Some(serde_json::to_value(payload).unwrap_or_default()),
        }
    }

    /// Create a Heartbeat ACK message (op=11)
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self {
            op: OpCode::HeartbeatAck,
            t: None,
            s: None,
            d: None,
        }
    }

    /// Create an Invalid Session message (op=7)
    #[must_use]
    pub fn invalid_session() -> Self {
        Self {
            op: OpCode::InvalidSession,
            t: None,
            s: None,
            d: Some(Value::Bool(false)),
        }
    }

    // === Parsing Client Messages ===

    /// Try to parse as an Identify payload (op=2)
    pub fn as_identify(&self) -> Option<IdentifyPayload> {
        if self.op != OpCode::Identify {
            return None;
        }
        self.d
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// Try to parse as a Subscribe payload (op=3)
    pub fn as_subscribe(&self) -> Option<SubscribePayload> {
        if self.op != OpCode::Subscribe {
            return None;
        }
        self.d
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// Try to parse as an Unsubscribe payload (op=4)
    pub fn as_unsubscribe(&self) -> Option<UnsubscribePayload> {
        if self.op != OpCode::Unsubscribe {
            return None;
        }
        self.d
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    // === Utilities ===

    /// Check if this is a valid client message
    #[must_use]
    pub fn is_valid_client_message(&self) -> bool {
        self.op.is_client_op()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Create an error close frame
    #[must_use]
    pub fn close_frame(code: CloseCode) -> (u16, String) {
        (code.as_u16(), code.description().to_string())
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayMessage(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayMessage(op={})", self.op)
        }
    }
}
