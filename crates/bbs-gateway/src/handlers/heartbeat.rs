//! Heartbeat handler (op 1)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayMessage};
use crate::server::GatewayState;
use std::sync::Arc;

/// Handles heartbeat messages
pub struct HeartbeatHandler;

impl HeartbeatHandler {
    /// Handle a heartbeat from the client
    ///
    /// A heartbeat counts as activity for the registry session, so an idle
    /// but connected client is not swept.
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
    ) -> HandlerResult<Option<CloseCode>> {
        connection.record_heartbeat().await;

        let registry = state.service_context().registry();
        match registry.get_by_connection(connection.id()) {
            Some(session) => registry.touch(&session.id),
            None => {
                // the session was swept while the socket stayed open; tell
                // the client to start over with a fresh Identify
                tracing::debug!(
                    connection_id = %connection.id(),
                    "Heartbeat for a swept session"
                );
                connection
                    .send(GatewayMessage::invalid_session())
                    .await
                    .map_err(|_| {
                        HandlerError::Internal("Failed to send InvalidSession".to_string())
                    })?;
                return Ok(None);
            }
        }

        tracing::trace!(
            connection_id = %connection.id(),
            server_seq = connection.current_sequence(),
            "Heartbeat received"
        );

        connection
            .send(GatewayMessage::heartbeat_ack())
            .await
            .map_err(|_| HandlerError::Internal("Failed to send heartbeat ACK".to_string()))?;

        Ok(None)
    }
}
