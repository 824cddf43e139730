//! Individual WebSocket connection
//!
//! Represents a single WebSocket connection and its state, including its
//! notification subscriptions and heartbeat bookkeeping.

use crate::protocol::GatewayMessage;
use bbs_core::{ConnectionId, EventCategory, NotificationEvent, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Notify, RwLock};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Connection established, waiting for Identify
    Connecting,
    /// Successfully identified
    Connected,
    /// Connection is being closed
    Disconnecting,
    /// Connection is closed
    Disconnected,
}

/// A single WebSocket connection
pub struct Connection {
    /// Unique connection id
    id: ConnectionId,

    /// Resolved user id (None until Identify)
    user_id: RwLock<Option<UserId>>,

    /// Display handle (None until Identify)
    handle: RwLock<Option<String>>,

    /// Current connection state
    state: RwLock<ConnectionState>,

    /// Channel to send messages to the WebSocket
    sender: mpsc::Sender<GatewayMessage>,

    /// Last sequence number sent
    sequence: AtomicU64,

    /// Last heartbeat received
    last_heartbeat: RwLock<Instant>,

    /// Subscribed categories, each with optional exact-match filters
    subscriptions: RwLock<HashMap<EventCategory, HashMap<String, String>>>,

    /// Fired by the heartbeat monitor to force-close the socket
    close_signal: Notify,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new connection
    pub fn new(id: ConnectionId, sender: mpsc::Sender<GatewayMessage>) -> Arc<Self> {
        Arc::new(Self {
            id,
            user_id: RwLock::new(None),
            handle: RwLock::new(None),
            state: RwLock::new(ConnectionState::Connecting),
            sender,
            sequence: AtomicU64::new(0),
            last_heartbeat: RwLock::new(Instant::now()),
            subscriptions: RwLock::new(HashMap::new()),
            close_signal: Notify::new(),
            created_at: Instant::now(),
        })
    }

    /// Get the connection id
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Get the user id (if identified)
    pub async fn user_id(&self) -> Option<UserId> {
        self.user_id.read().await.clone()
    }

    /// Get the handle (if identified)
    pub async fn handle(&self) -> Option<String> {
        self.handle.read().await.clone()
    }

    /// Attach the resolved identity
    pub async fn set_identity(&self, user_id: UserId, handle: impl Into<String>) {
        *self.user_id.write().await = Some(user_id);
        *self.handle.write().await = Some(handle.into());
    }

    /// Get the current state
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Set the connection state
    pub async fn set_state(&self, state: ConnectionState) {
        *self.state.write().await = state;
    }

    /// Check if the connection has a resolved identity
    pub async fn is_authenticated(&self) -> bool {
        self.user_id.read().await.is_some()
    }

    /// Get the next sequence number
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Get the current sequence number
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Record a heartbeat received
    pub async fn record_heartbeat(&self) {
        *self.last_heartbeat.write().await = Instant::now();
    }

    /// Get time since last heartbeat
    pub async fn time_since_heartbeat(&self) -> std::time::Duration {
        self.last_heartbeat.read().await.elapsed()
    }

    // === Subscriptions ===

    /// Add subscriptions for the given categories
    ///
    /// Re-subscribing a category replaces its filters.
    pub async fn add_subscriptions(
        &self,
        categories: &[EventCategory],
        filters: &HashMap<String, String>,
    ) {
        let mut subs = self.subscriptions.write().await;
        for category in categories {
            let applicable: HashMap<String, String> = filters
                .iter()
                .filter(|(k, _)| category.filterable_fields().contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            subs.insert(*category, applicable);
        }
    }

    /// Drop subscriptions for the given categories
    pub async fn remove_subscriptions(&self, categories: &[EventCategory]) {
        let mut subs = self.subscriptions.write().await;
        for category in categories {
            subs.remove(category);
        }
    }

    /// Number of held subscriptions
    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    /// Categories not yet held, in input order
    pub async fn new_categories(&self, categories: &[EventCategory]) -> Vec<EventCategory> {
        let subs = self.subscriptions.read().await;
        categories
            .iter()
            .filter(|c| !subs.contains_key(c))
            .copied()
            .collect()
    }

    /// Whether this connection should receive the event
    ///
    /// Requires a subscription to the category whose filters all match the
    /// event's declared filterable fields.
    pub async fn wants(&self, event: &NotificationEvent) -> bool {
        let subs = self.subscriptions.read().await;
        match subs.get(&event.category) {
            Some(filters) => filters
                .iter()
                .all(|(field, expected)| event.filter_field(field) == Some(expected.as_str())),
            None => false,
        }
    }

    // === Lifecycle ===

    /// Force-close this connection (used by the heartbeat monitor)
    pub async fn close(&self) {
        self.set_state(ConnectionState::Disconnecting).await;
        self.close_signal.notify_waiters();
    }

    /// Wait until the connection is force-closed
    pub async fn closed(&self) {
        self.close_signal.notified().await;
    }

    /// Get connection age
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Send a message to this connection
    pub async fn send(
        &self,
        message: GatewayMessage,
    ) -> Result<(), mpsc::error::SendError<GatewayMessage>> {
        self.sender.send(message).await
    }

    /// Try to send a message (non-blocking)
    pub fn try_send(
        &self,
        message: GatewayMessage,
    ) -> Result<(), mpsc::error::TrySendError<GatewayMessage>> {
        self.sender.try_send(message)
    }

    /// Check if the sender channel is closed
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .field("created_at", &self.created_at)
            .finish()
    }
}
