//! Heartbeat monitoring
//!
//! Periodically checks every registered connection and force-closes the ones
//! that stopped heartbeating or never identified within the grace period.

use crate::connection::Connection;
use crate::hub::NotificationHub;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Background task that evicts dead connections
pub struct HeartbeatMonitor {
    hub: Arc<NotificationHub>,
    /// Missing-heartbeat window before eviction
    timeout: Duration,
    /// How long an unidentified connection may linger
    auth_grace: Duration,
    /// Check interval
    interval: Duration,
    /// Whether the monitor is running
    running: Arc<AtomicBool>,
}

impl HeartbeatMonitor {
    /// Create a monitor from the hub's configuration
    pub fn new(hub: Arc<NotificationHub>) -> Arc<Self> {
        let config = hub.config();
        let timeout = Duration::from_millis(config.heartbeat_timeout_ms);
        let auth_grace = Duration::from_millis(config.auth_grace_ms);
        // check twice per timeout window so eviction lag stays bounded
        let interval = Duration::from_millis((config.heartbeat_timeout_ms / 2).max(1));

        Arc::new(Self {
            hub,
            timeout,
            auth_grace,
            interval,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start the monitor loop
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Heartbeat monitor is already running");
            return;
        }

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.interval);
            ticker.tick().await;

            while monitor.running.load(Ordering::SeqCst) {
                ticker.tick().await;
                monitor.check_all().await;
            }
        });

        tracing::info!("Heartbeat monitor started");
    }

    /// Stop the monitor loop
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Heartbeat monitor stopped");
    }

    /// Whether the monitor loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one eviction pass over all connections
    pub async fn check_all(&self) {
        for conn in self.hub.iter_connections() {
            if self.should_evict(&conn).await {
                tracing::info!(
                    connection_id = %conn.id(),
                    "Evicting unresponsive connection"
                );
                conn.close().await;
                self.hub.on_connection_closed(conn.id());
            }
        }
    }

    async fn should_evict(&self, conn: &Arc<Connection>) -> bool {
        if conn.is_closed() {
            return true;
        }
        if conn.time_since_heartbeat().await > self.timeout {
            return true;
        }
        // never identified and past the grace window
        !conn.is_authenticated().await && conn.age() > self.auth_grace
    }
}

impl Drop for HeartbeatMonitor {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
