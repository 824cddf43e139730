//! Service context - dependency container for services
//!
//! Holds the session registry, door registry, durable store, and rate
//! limiters needed by the orchestration layer.

use std::sync::Arc;

use bbs_common::RateLimitConfig;
use bbs_core::{DoorId, GameSessionRepository, UserId};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::doors::DoorRegistry;
use crate::rate_limit::RateLimiter;
use crate::registry::SessionRegistry;

/// Service context containing all dependencies
///
/// The main dependency container passed to services. Cloning is cheap; all
/// contents are shared handles.
#[derive(Clone)]
pub struct ServiceContext {
    registry: Arc<SessionRegistry>,
    game_sessions: Arc<dyn GameSessionRepository>,
    doors: Arc<DoorRegistry>,

    // Limiters, one per throttled surface
    message_limiter: Arc<RateLimiter>,
    door_input_limiter: Arc<RateLimiter>,
    subscription_limiter: Arc<RateLimiter>,

    // Per-(user, door) entry serialization for the door orchestrator
    door_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        registry: Arc<SessionRegistry>,
        game_sessions: Arc<dyn GameSessionRepository>,
        doors: Arc<DoorRegistry>,
        rate_limits: &RateLimitConfig,
    ) -> Self {
        Self {
            registry,
            game_sessions,
            doors,
            message_limiter: RateLimiter::new_shared(&rate_limits.message_post),
            door_input_limiter: RateLimiter::new_shared(&rate_limits.door_input),
            subscription_limiter: RateLimiter::new_shared(&rate_limits.subscription_change),
            door_locks: Arc::new(DashMap::new()),
        }
    }

    /// Get the session registry
    pub fn registry(&self) -> &SessionRegistry {
        self.registry.as_ref()
    }

    /// Get the session registry as a shared handle
    pub fn registry_handle(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Get the durable game-session store
    pub fn game_sessions(&self) -> &dyn GameSessionRepository {
        self.game_sessions.as_ref()
    }

    /// Get the door registry
    pub fn doors(&self) -> &DoorRegistry {
        self.doors.as_ref()
    }

    /// Get the message posting limiter
    pub fn message_limiter(&self) -> &RateLimiter {
        self.message_limiter.as_ref()
    }

    /// Get the door input limiter
    pub fn door_input_limiter(&self) -> &RateLimiter {
        self.door_input_limiter.as_ref()
    }

    /// Get the subscription churn limiter
    pub fn subscription_limiter(&self) -> &RateLimiter {
        self.subscription_limiter.as_ref()
    }

    /// Owned handle to the subscription limiter, for sharing with the hub
    pub fn subscription_limiter_handle(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.subscription_limiter)
    }

    /// Entry lock for one (user, door) pair
    ///
    /// Concurrent enter/input/exit for the same pair serialize on this lock;
    /// different pairs proceed independently.
    pub fn door_lock(&self, user_id: &UserId, door_id: &DoorId) -> Arc<Mutex<()>> {
        let key = format!("{user_id}:{door_id}");
        self.door_locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the (user, door) entry lock if no task holds a handle to it
    ///
    /// The strong-count check runs under the map's entry guard, so a
    /// concurrent `door_lock` either cloned the Arc already (count > 1,
    /// entry stays) or will create a fresh one after removal.
    pub fn reclaim_door_lock(&self, user_id: &UserId, door_id: &DoorId) {
        let key = format!("{user_id}:{door_id}");
        self.door_locks
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of live (user, door) entry locks
    pub fn tracked_door_locks(&self) -> usize {
        self.door_locks.len()
    }

    /// Start the background maintenance tasks owned by the context
    pub fn start_background_tasks(&self) {
        self.registry.start_sweeper();
        self.message_limiter.start_reclaimer();
        self.door_input_limiter.start_reclaimer();
        self.subscription_limiter.start_reclaimer();
    }

    /// Stop the background maintenance tasks
    pub fn stop_background_tasks(&self) {
        self.registry.stop_sweeper();
        self.message_limiter.stop_reclaimer();
        self.door_input_limiter.stop_reclaimer();
        self.subscription_limiter.stop_reclaimer();
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("registry", &self.registry)
            .field("doors", &self.doors)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
pub struct ServiceContextBuilder {
    registry: Option<Arc<SessionRegistry>>,
    game_sessions: Option<Arc<dyn GameSessionRepository>>,
    doors: Option<Arc<DoorRegistry>>,
    rate_limits: Option<RateLimitConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            game_sessions: None,
            doors: None,
            rate_limits: None,
        }
    }

    pub fn registry(mut self, registry: Arc<SessionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn game_sessions(mut self, repo: Arc<dyn GameSessionRepository>) -> Self {
        self.game_sessions = Some(repo);
        self
    }

    pub fn doors(mut self, doors: Arc<DoorRegistry>) -> Self {
        self.doors = Some(doors);
        self
    }

    pub fn rate_limits(mut self, rate_limits: RateLimitConfig) -> Self {
        self.rate_limits = Some(rate_limits);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> super::error::ServiceResult<ServiceContext> {
        let registry = self
            .registry
            .ok_or_else(|| super::error::ServiceError::validation("registry is required"))?;
        let game_sessions = self
            .game_sessions
            .ok_or_else(|| super::error::ServiceError::validation("game_sessions is required"))?;
        let doors = self
            .doors
            .ok_or_else(|| super::error::ServiceError::validation("doors is required"))?;
        let rate_limits = self
            .rate_limits
            .ok_or_else(|| super::error::ServiceError::validation("rate_limits is required"))?;

        Ok(ServiceContext::new(
            registry,
            game_sessions,
            doors,
            &rate_limits,
        ))
    }
}

impl Default for ServiceContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
