//! WebSocket handler
//!
//! Handles WebSocket connections and message processing.

use crate::connection::{Connection, ConnectionState};
use crate::handlers::MessageDispatcher;
use crate::protocol::{CloseCode, GatewayMessage, HelloPayload};
use crate::server::GatewayState;
use axum::{
    extract::{ws::Message, State, WebSocketUpgrade},
    response::IntoResponse,
};
use bbs_core::{EventCategory, NotificationEvent};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Channel buffer size for outgoing messages
const MESSAGE_BUFFER_SIZE: usize = 100;

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: axum::extract::ws::WebSocket) {
    // Create outgoing message channel and register the connection
    let (tx, mut rx) = mpsc::channel::<GatewayMessage>(MESSAGE_BUFFER_SIZE);

    let connection_id = bbs_core::ConnectionId::generate();
    let session = state
        .service_context()
        .registry()
        .create(Some(connection_id.clone()));

    let connection = Connection::new(connection_id.clone(), tx);
    state.hub().register(Arc::clone(&connection));

    tracing::info!(
        connection_id = %connection_id,
        session_id = %session.id,
        "WebSocket connection established"
    );

    // Split the WebSocket
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Send Hello message immediately
    let hello = GatewayMessage::hello(HelloPayload::with_interval(
        state.config().hub.heartbeat_interval_ms,
    ));
    if let Ok(json) = hello.to_json() {
        if ws_sink.send(Message::Text(json)).await.is_err() {
            tracing::warn!(connection_id = %connection_id, "Failed to send Hello message");
            cleanup_connection(&state, &connection).await;
            return;
        }
    }

    // Clone for tasks
    let state_recv = state.clone();
    let connection_recv = Arc::clone(&connection);

    // Spawn task to receive messages from WebSocket
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(close_code) =
                        handle_text_message(&state_recv, &connection_recv, &text).await
                    {
                        tracing::debug!(
                            connection_id = %connection_recv.id(),
                            close_code = ?close_code,
                            "Closing connection due to error"
                        );
                        return Some(close_code);
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        connection_id = %connection_recv.id(),
                        "Binary messages not supported"
                    );
                    return Some(CloseCode::DecodeError);
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    tracing::trace!(connection_id = %connection_recv.id(), "Ping/Pong");
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(
                        connection_id = %connection_recv.id(),
                        "Client closed connection"
                    );
                    return None;
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_recv.id(),
                        error = %e,
                        "WebSocket error"
                    );
                    return Some(CloseCode::UnknownError);
                }
            }
        }
        None
    });

    // Spawn task to send messages to WebSocket
    let connection_send = Arc::clone(&connection);
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = msg.to_json() {
                if ws_sink.send(Message::Text(json)).await.is_err() {
                    tracing::warn!(
                        connection_id = %connection_send.id(),
                        "Failed to send message to WebSocket"
                    );
                    break;
                }
            }
        }

        // Close the WebSocket when channel is closed
        let _ = ws_sink.close().await;
    });

    // Wait for either pump to finish or a forced close from the monitor
    let connection_close = Arc::clone(&connection);
    tokio::select! {
        result = recv_task => {
            if let Ok(Some(close_code)) = result {
                tracing::debug!(
                    connection_id = %connection.id(),
                    close_code = ?close_code,
                    "Receive task ended with close code"
                );
            }
        }
        _ = send_task => {
            tracing::debug!(connection_id = %connection.id(), "Send task ended");
        }
        () = connection_close.closed() => {
            tracing::debug!(connection_id = %connection.id(), "Connection force-closed");
        }
    }

    cleanup_connection(&state, &connection).await;
}

/// Handle a text message from the client
async fn handle_text_message(
    state: &GatewayState,
    connection: &Arc<Connection>,
    text: &str,
) -> Result<(), CloseCode> {
    let message = match GatewayMessage::from_json(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(
                connection_id = %connection.id(),
                error = %e,
                "Failed to parse message"
            );
            return Err(CloseCode::DecodeError);
        }
    };

    tracing::trace!(
        connection_id = %connection.id(),
        op = %message.op,
        "Received message"
    );

    match MessageDispatcher::dispatch(state, connection, message).await {
        Ok(Some(close_code)) => Err(close_code),
        Ok(None) => Ok(()),
        Err(e) => {
            if let Some(close_code) = e.to_close_code() {
                tracing::warn!(
                    connection_id = %connection.id(),
                    error = %e,
                    "Handler error"
                );
                return Err(close_code);
            }

            // recoverable failure: mirror it as an ERROR dispatch, keep going
            tracing::debug!(
                connection_id = %connection.id(),
                error = %e,
                "Handler rejection"
            );
            state.hub().notify(
                connection.id(),
                NotificationEvent::new(
                    EventCategory::Error,
                    serde_json::json!({
                        "code": e.code(),
                        "message": e.to_string(),
                    }),
                ),
            );
            Ok(())
        }
    }
}

/// Clean up a connection on disconnect
async fn cleanup_connection(state: &GatewayState, connection: &Arc<Connection>) {
    tracing::info!(connection_id = %connection.id(), "Cleaning up connection");

    connection.set_state(ConnectionState::Disconnected).await;

    if let (Some(user_id), Some(handle)) = (connection.user_id().await, connection.handle().await) {
        state
            .hub()
            .broadcast(NotificationEvent::new(
                EventCategory::UserLeft,
                serde_json::json!({
                    "user_id": user_id.to_string(),
                    "handle": handle,
                }),
            ))
            .await;
    }

    state.hub().on_connection_closed(connection.id());
    state
        .service_context()
        .registry()
        .remove_by_connection(connection.id());
}
