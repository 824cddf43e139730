//! Subscribe / Unsubscribe handlers (ops 3 and 4)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::hub::SubscribeError;
use crate::protocol::{CloseCode, GatewayMessage, SubscribePayload, UnsubscribePayload};
use crate::server::GatewayState;
use bbs_core::EventCategory;
use std::sync::Arc;

/// Handles subscription changes
pub struct SubscribeHandler;

impl SubscribeHandler {
    /// Handle a Subscribe message
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: SubscribePayload,
    ) -> HandlerResult<Option<CloseCode>> {
        let categories = parse_categories(&payload.event_types)?;

        state
            .hub()
            .subscribe(connection, &categories, &payload.filters)
            .await?;

        tracing::debug!(
            connection_id = %connection.id(),
            event_types = ?payload.event_types,
            "Subscribed"
        );

        send_ack(connection, "SUBSCRIBE_ACK", &payload.event_types).await?;
        Ok(None)
    }
}

/// Handles unsubscription
pub struct UnsubscribeHandler;

impl UnsubscribeHandler {
    /// Handle an Unsubscribe message
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: UnsubscribePayload,
    ) -> HandlerResult<Option<CloseCode>> {
        let categories = parse_categories(&payload.event_types)?;

        state.hub().unsubscribe(connection, &categories).await?;

        send_ack(connection, "UNSUBSCRIBE_ACK", &payload.event_types).await?;
        Ok(None)
    }
}

fn parse_categories(event_types: &[String]) -> HandlerResult<Vec<EventCategory>> {
    if event_types.is_empty() {
        return Err(HandlerError::InvalidPayload(
            "event_types must not be empty".to_string(),
        ));
    }
    event_types
        .iter()
        .map(|name| {
            EventCategory::parse(name)
                .ok_or_else(|| SubscribeError::UnknownCategory(name.clone()).into())
        })
        .collect()
}

async fn send_ack(
    connection: &Arc<Connection>,
    event_type: &str,
    event_types: &[String],
) -> HandlerResult<()> {
    let seq = connection.next_sequence();
    connection
        .send(GatewayMessage::dispatch(
            event_type,
            seq,
            serde_json::json!({ "event_types": event_types }),
        ))
        .await
        .map_err(|e| HandlerError::Internal(format!("Failed to send {event_type}: {e}")))
}
