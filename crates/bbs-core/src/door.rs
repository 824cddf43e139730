//! Door capability contract
//!
//! A door is a pluggable interactive activity. Variants implement this trait
//! and are registered by id in a lookup table; the orchestrator is
//! polymorphic over the capability set and never depends on one door's
//! internals. Door failures are opaque (`anyhow`) and are caught at the
//! orchestrator boundary rather than propagated to callers.

use async_trait::async_trait;

use crate::entities::Session;
use crate::value_objects::DoorId;

/// Result type for door operations
pub type DoorResult = anyhow::Result<String>;

/// A pluggable interactive activity with enter/continue/exit behavior
#[async_trait]
pub trait Door: Send + Sync {
    /// Registered id of this door
    fn id(&self) -> DoorId;

    /// Human-readable name shown in menus
    fn name(&self) -> &str;

    /// Called when a session enters the door; returns the opening text.
    ///
    /// If the session's data bag already carries restored door state, the
    /// door must continue from it rather than starting over.
    async fn enter(&self, session: &mut Session) -> DoorResult;

    /// Called for each line of input; returns the rendered response.
    ///
    /// A door signals completion by flipping the session out of the door
    /// state (`session.leave_door()`) as a side effect.
    async fn handle_input(&self, input: &str, session: &mut Session) -> DoorResult;

    /// Called when the session leaves the door; returns the farewell text
    async fn exit(&self, session: &mut Session) -> DoorResult;
}
