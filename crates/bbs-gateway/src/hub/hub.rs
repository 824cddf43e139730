//! Notification hub
//!
//! Tracks live WebSocket connections, their subscriptions, and fans domain
//! events out to every connection whose subscription matches.

use crate::connection::Connection;
use crate::hub::BatchBuffer;
use bbs_common::config::HubConfig;
use bbs_core::{ConnectionId, DomainError, EventCategory, NotificationEvent};
use bbs_service::RateLimiter;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Subscription request failures
///
/// A failed subscribe never alters the connection's existing subscriptions.
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("Unknown event category: {0}")]
    UnknownCategory(String),

    #[error("Unknown filter field: {0}")]
    UnknownFilterField(String),

    #[error("Subscribing to {0} requires identification")]
    RequiresAuthentication(EventCategory),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl SubscribeError {
    /// Error code for ERROR dispatches
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownCategory(_) => "UNKNOWN_EVENT_CATEGORY",
            Self::UnknownFilterField(_) => "UNKNOWN_FILTER_FIELD",
            Self::RequiresAuthentication(_) => "NOT_AUTHENTICATED",
            Self::Domain(e) => e.code(),
        }
    }
}

struct ConnectionEntry {
    conn: Arc<Connection>,
    buffer: Arc<BatchBuffer>,
}

/// Central registry of live connections and event fan-out
pub struct NotificationHub {
    /// All registered connections
    connections: DashMap<ConnectionId, ConnectionEntry>,

    /// Hub tuning (batching, heartbeats, subscription cap)
    config: HubConfig,

    /// Limits subscription churn per connection
    subscription_limiter: Arc<RateLimiter>,
}

impl NotificationHub {
    /// Create a new hub
    pub fn new(config: HubConfig, subscription_limiter: Arc<RateLimiter>) -> Self {
        Self {
            connections: DashMap::new(),
            config,
            subscription_limiter,
        }
    }

    /// Create a new hub wrapped in an Arc
    pub fn new_shared(config: HubConfig, subscription_limiter: Arc<RateLimiter>) -> Arc<Self> {
        Arc::new(Self::new(config, subscription_limiter))
    }

    /// Hub configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Register a connection for event delivery
    pub fn register(&self, conn: Arc<Connection>) {
        let buffer = BatchBuffer::new(self.config.batch_window_ms, self.config.max_batch_size);
        self.connections
            .insert(conn.id().clone(), ConnectionEntry { conn, buffer });
    }

    /// Look up a registered connection
    pub fn get(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|e| Arc::clone(&e.conn))
    }

    /// Number of registered connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Snapshot of all registered connections
    pub fn iter_connections(&self) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .map(|e| Arc::clone(&e.conn))
            .collect()
    }

    /// Add subscriptions for a connection
    ///
    /// All checks run before any state changes, so a rejected request leaves
    /// the connection's subscriptions untouched.
    pub async fn subscribe(
        &self,
        conn: &Arc<Connection>,
        categories: &[EventCategory],
        filters: &HashMap<String, String>,
    ) -> Result<(), SubscribeError> {
        let authenticated = conn.is_authenticated().await;
        for category in categories {
            if category.requires_authentication() && !authenticated {
                return Err(SubscribeError::RequiresAuthentication(*category));
            }
        }

        for field in filters.keys() {
            let known = categories
                .iter()
                .any(|c| c.filterable_fields().contains(&field.as_str()));
            if !known {
                return Err(SubscribeError::UnknownFilterField(field.clone()));
            }
        }

        self.check_churn(conn)?;

        let new = conn.new_categories(categories).await;
        let max = self.config.max_subscriptions;
        if conn.subscription_count().await + new.len() > max {
            return Err(DomainError::SubscriptionLimitExceeded { max }.into());
        }

        conn.add_subscriptions(categories, filters).await;

        tracing::debug!(
            connection_id = %conn.id(),
            categories = categories.len(),
            "Subscriptions added"
        );
        Ok(())
    }

    /// Drop subscriptions for a connection
    pub async fn unsubscribe(
        &self,
        conn: &Arc<Connection>,
        categories: &[EventCategory],
    ) -> Result<(), SubscribeError> {
        self.check_churn(conn)?;
        conn.remove_subscriptions(categories).await;
        Ok(())
    }

    fn check_churn(&self, conn: &Arc<Connection>) -> Result<(), SubscribeError> {
        let key = format!("sub:{}", conn.id());
        if !self.subscription_limiter.check(&key) {
            return Err(DomainError::SubscriptionRateLimited {
                retry_in_secs: self.subscription_limiter.reset_in_seconds(&key),
            }
            .into());
        }
        Ok(())
    }

    /// Fan an event out to every connection whose subscription matches
    ///
    /// Returns the number of connections the event was accepted for.
    /// Acceptance feeds the batch buffer; actual delivery is best-effort.
    pub async fn broadcast(&self, event: NotificationEvent) -> usize {
        let targets = self.iter_and_buffers();
        let mut accepted = 0;

        for (conn, buffer) in &targets {
            if conn.wants(&event).await {
                buffer.push(conn, event.clone());
                accepted += 1;
            }
        }

        tracing::trace!(
            category = %event.category,
            accepted = accepted,
            "Event broadcast"
        );
        accepted
    }

    /// Fan an event out to matching connections with a resolved identity
    pub async fn broadcast_to_authenticated(&self, event: NotificationEvent) -> usize {
        let targets = self.iter_and_buffers();
        let mut accepted = 0;

        for (conn, buffer) in &targets {
            if conn.is_authenticated().await && conn.wants(&event).await {
                buffer.push(conn, event.clone());
                accepted += 1;
            }
        }

        accepted
    }

    /// Deliver an event to one connection regardless of subscriptions
    ///
    /// Used for ERROR mirroring to the connection that caused the error.
    pub fn notify(&self, id: &ConnectionId, event: NotificationEvent) {
        if let Some(entry) = self.connections.get(id) {
            entry.buffer.push(&entry.conn, event);
        }
    }

    /// Remove a closed connection
    ///
    /// Safe to call more than once for the same id.
    pub fn on_connection_closed(&self, id: &ConnectionId) {
        if self.connections.remove(id).is_some() {
            tracing::debug!(connection_id = %id, "Connection removed from hub");
        }
    }

    fn iter_and_buffers(&self) -> Vec<(Arc<Connection>, Arc<BatchBuffer>)> {
        self.connections
            .iter()
            .map(|e| (Arc::clone(&e.conn), Arc::clone(&e.buffer)))
            .collect()
    }
}
