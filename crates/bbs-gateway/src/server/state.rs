//! Gateway state
//!
//! Application state shared by both transports.

use crate::hub::{HeartbeatMonitor, NotificationHub};
use bbs_common::AppConfig;
use bbs_service::ServiceContext;
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// Service context with registry, doors, and limiters
    service_context: Arc<ServiceContext>,
    /// Notification hub for WebSocket connections
    hub: Arc<NotificationHub>,
    /// Heartbeat monitor for connection eviction
    heartbeat_monitor: Arc<HeartbeatMonitor>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(service_context: ServiceContext, hub: Arc<NotificationHub>, config: AppConfig) -> Self {
        let heartbeat_monitor = HeartbeatMonitor::new(Arc::clone(&hub));
        Self {
            service_context: Arc::new(service_context),
            hub,
            heartbeat_monitor,
            config: Arc::new(config),
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Get the notification hub
    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    /// Get the heartbeat monitor
    pub fn heartbeat_monitor(&self) -> &Arc<HeartbeatMonitor> {
        &self.heartbeat_monitor
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Start background tasks (sweeper, limiter reclaim, heartbeat monitor)
    pub fn start_background_tasks(&self) {
        self.service_context.start_background_tasks();
        self.heartbeat_monitor.start();
    }

    /// Stop background tasks
    pub fn stop_background_tasks(&self) {
        self.heartbeat_monitor.stop();
        self.service_context.stop_background_tasks();
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connections", &self.hub.connection_count())
            .field("config", &"AppConfig")
            .finish()
    }
}
