//! Session registry
//!
//! Single source of truth for "who is connected/acting and in what state".
//! Two independent id-keyed maps (connection id -> session id, session id ->
//! session) so either side can be torn down without dangling references.

use bbs_common::SessionConfig;
use bbs_core::{ConnectionId, DoorId, Session, SessionId, SessionPatch, UserId};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory session table with a periodic inactivity sweep
///
/// All lookups return snapshot clones; "not found" is an `Option`, never an
/// error. Mutations go through the operations here; no other component
/// touches the indices directly.
pub struct SessionRegistry {
    /// Sessions by session id
    sessions: DashMap<SessionId, Session>,

    /// Connection id to session id mapping
    by_connection: DashMap<ConnectionId, SessionId>,

    /// Inactivity timeout before the sweep evicts a session
    timeout: chrono::Duration,

    /// Sweep tick interval
    sweep_interval: Duration,

    /// Whether the sweeper task is running
    running: Arc<AtomicBool>,
}

impl SessionRegistry {
    /// Create a new registry from configuration
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            by_connection: DashMap::new(),
            timeout: chrono::Duration::seconds(config.timeout_secs as i64),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a new registry wrapped in Arc
    #[must_use]
    pub fn new_shared(config: &SessionConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    /// Allocate a fresh session in the initial state
    pub fn create(&self, connection_id: Option<ConnectionId>) -> Session {
        let session = Session::new(connection_id.clone());

        if let Some(conn_id) = connection_id {
            self.by_connection.insert(conn_id, session.id.clone());
        }
        self.sessions.insert(session.id.clone(), session.clone());

        tracing::debug!(session_id = %session.id, "Session created");

        session
    }

    /// Get a session snapshot by id
    pub fn get(&self, session_id: &SessionId) -> Option<Session> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    /// Get a session snapshot by connection id
    pub fn get_by_connection(&self, connection_id: &ConnectionId) -> Option<Session> {
        let session_id = self.by_connection.get(connection_id)?.clone();
        self.get(&session_id)
    }

    /// Merge a partial update into a session, refreshing last-activity
    ///
    /// Updating a non-existent session is a logged no-op.
    pub fn update(&self, session_id: &SessionId, patch: SessionPatch) {
        match self.sessions.get_mut(session_id) {
            Some(mut session) => session.apply(patch),
            None => {
                tracing::warn!(session_id = %session_id, "Update on unknown session ignored");
            }
        }
    }

    /// Write back a whole session snapshot
    ///
    /// Used after an await point where a mutable map guard cannot be held;
    /// the caller serializes concurrent writers for the same session.
    pub fn replace(&self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    /// Refresh a session's last-activity timestamp only
    pub fn touch(&self, session_id: &SessionId) {
        if let Some(mut session) = self.sessions.get_mut(session_id) {
            session.touch();
        }
    }

    /// Remove a session, deleting both index entries
    pub fn remove(&self, session_id: &SessionId) {
        if let Some((_, session)) = self.sessions.remove(session_id) {
            if let Some(conn_id) = session.connection_id {
                self.by_connection.remove(&conn_id);
            }
            tracing::debug!(session_id = %session_id, "Session removed");
        }
    }

    /// Remove whatever session owns the given connection
    pub fn remove_by_connection(&self, connection_id: &ConnectionId) {
        if let Some((_, session_id)) = self.by_connection.remove(connection_id) {
            self.sessions.remove(&session_id);
            tracing::debug!(
                session_id = %session_id,
                connection_id = %connection_id,
                "Session removed by connection"
            );
        }
    }

    /// Snapshot copy of every session
    ///
    /// Callers may mutate the registry while iterating the result.
    pub fn list_all(&self) -> Vec<Session> {
        self.sessions.iter().map(|s| s.clone()).collect()
    }

    /// Find the live session a user holds inside the named door, if any
    pub fn find_door_session(&self, user_id: &UserId, door_id: &DoorId) -> Option<Session> {
        self.sessions
            .iter()
            .find(|s| s.belongs_to(user_id) && s.is_in_door(door_id))
            .map(|s| s.clone())
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Evict every session idle beyond the configured timeout
    ///
    /// Timestamps are read from the live entry under the shard lock, so a
    /// `touch` that completes before the sweep reads a session cannot lose
    /// to a stale value.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let timeout = self.timeout;
        let mut evicted: Vec<(SessionId, Option<ConnectionId>)> = Vec::new();

        self.sessions.retain(|id, session| {
            if session.idle_for(now) > timeout {
                evicted.push((id.clone(), session.connection_id.clone()));
                false
            } else {
                true
            }
        });

        for (session_id, conn_id) in &evicted {
            if let Some(conn_id) = conn_id {
                self.by_connection.remove(conn_id);
            }
            tracing::info!(session_id = %session_id, "Session evicted by sweep");
        }

        evicted.len()
    }

    /// Start the periodic sweep task
    pub fn start_sweeper(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Session sweeper is already running");
            return;
        }

        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(registry.sweep_interval);
            // The first tick completes immediately; skip it.
            tick.tick().await;

            while registry.running.load(Ordering::SeqCst) {
                tick.tick().await;
                if !registry.running.load(Ordering::SeqCst) {
                    break;
                }

                let evicted = registry.sweep();
                if evicted > 0 {
                    tracing::info!(evicted, "Session sweep completed");
                }
            }

            tracing::info!("Session sweeper stopped");
        });

        tracing::info!(interval = ?self.sweep_interval, "Session sweeper started");
    }

    /// Stop the sweep task
    pub fn stop_sweeper(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the sweeper is running
    pub fn sweeper_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("connections", &self.by_connection.len())
            .finish()
    }
}
