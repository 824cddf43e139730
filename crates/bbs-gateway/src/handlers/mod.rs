//! Op code handlers
//!
//! Handles incoming WebSocket messages based on their operation code.

mod error;
mod heartbeat;
mod identify;
mod subscribe;

pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;
pub use identify::IdentifyHandler;
pub use subscribe::{SubscribeHandler, UnsubscribeHandler};

use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayMessage, OpCode};
use crate::server::GatewayState;
use std::sync::Arc;

/// Dispatch incoming client messages to appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle an incoming client message
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        message: GatewayMessage,
    ) -> HandlerResult<Option<CloseCode>> {
        // Validate that this is a client-sendable op code
        if !message.op.is_client_op() {
            tracing::warn!(
                connection_id = %connection.id(),
                op = %message.op,
                "Received server-only op code from client"
            );
            return Ok(Some(CloseCode::UnknownOpcode));
        }

        match message.op {
            OpCode::Identify => {
                let payload = message.as_identify().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Identify payload".to_string())
                })?;

                IdentifyHandler::handle(state, connection, payload).await
            }
            OpCode::Heartbeat => HeartbeatHandler::handle(state, connection).await,
            OpCode::Subscribe => {
                let payload = message.as_subscribe().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Subscribe payload".to_string())
                })?;

                SubscribeHandler::handle(state, connection, payload).await
            }
            OpCode::Unsubscribe => {
                let payload = message.as_unsubscribe().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Unsubscribe payload".to_string())
                })?;

                UnsubscribeHandler::handle(state, connection, payload).await
            }
            // These ops should never reach here due to is_client_op check
            _ => {
                tracing::error!(op = %message.op, "Unhandled client op code");
                Ok(Some(CloseCode::UnknownOpcode))
            }
        }
    }
}
