//! Identify handler (op 2)

use super::{HandlerError, HandlerResult};
use crate::connection::{Connection, ConnectionState};
use crate::protocol::{CloseCode, GatewayMessage, IdentifyPayload, ReadyPayload};
use crate::server::GatewayState;
use bbs_core::{EventCategory, NotificationEvent, SessionPatch, SessionState, UserId};
use std::sync::Arc;

/// Protocol version echoed in READY
const GATEWAY_VERSION: u8 = 1;

/// Handles Identify messages
pub struct IdentifyHandler;

impl IdentifyHandler {
    /// Handle an Identify message
    ///
    /// The identity is resolved upstream and trusted here; an invalid shape
    /// is rejected, a repeat Identify closes the connection.
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: IdentifyPayload,
    ) -> HandlerResult<Option<CloseCode>> {
        if connection.is_authenticated().await {
            tracing::warn!(
                connection_id = %connection.id(),
                "Client sent Identify while already authenticated"
            );
            return Ok(Some(CloseCode::AlreadyAuthenticated));
        }

        if !payload.is_valid() {
            return Err(HandlerError::IdentityRejected(
                "user_id and handle must be non-empty".to_string(),
            ));
        }

        let user_id = UserId::new(payload.user_id.trim());
        let handle = payload.handle.trim().to_string();

        let registry = state.service_context().registry();
        // recreate the session if it was swept while the socket idled
        let session = registry
            .get_by_connection(connection.id())
            .unwrap_or_else(|| registry.create(Some(connection.id().clone())));

        registry.update(
            &session.id,
            SessionPatch::new()
                .user(user_id.clone(), handle.clone())
                .state(SessionState::Authenticated),
        );

        connection.set_identity(user_id.clone(), handle.clone()).await;
        connection.set_state(ConnectionState::Connected).await;

        let ready = ReadyPayload {
            v: GATEWAY_VERSION,
            session_id: session.id.to_string(),
            user_id: user_id.to_string(),
            handle: handle.clone(),
        };
        let ready_data = serde_json::to_value(&ready)
            .map_err(|e| HandlerError::Internal(format!("Failed to encode READY: {e}")))?;

        let seq = connection.next_sequence();
        connection
            .send(GatewayMessage::dispatch("READY", seq, ready_data))
            .await
            .map_err(|e| HandlerError::Internal(format!("Failed to send READY: {e}")))?;

        tracing::info!(
            connection_id = %connection.id(),
            session_id = %session.id,
            user_id = %user_id,
            handle = %handle,
            "Client identified"
        );

        state
            .hub()
            .broadcast(NotificationEvent::new(
                EventCategory::UserJoined,
                serde_json::json!({
                    "user_id": user_id.to_string(),
                    "handle": handle,
                }),
            ))
            .await;

        Ok(None)
    }
}
