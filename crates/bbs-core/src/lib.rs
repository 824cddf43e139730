//! # bbs-core
//!
//! Domain layer containing entities, value objects, the door capability trait,
//! repository traits, and domain errors.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod door;
pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use door::{Door, DoorResult};
pub use entities::{
    GameSessionRecord, InteractionEntry, Session, SessionPatch, SessionState, DATA_ACTIVE_DOOR,
    DATA_DOOR_HISTORY, DATA_DOOR_STATE,
};
pub use error::DomainError;
pub use events::{EventCategory, NotificationEvent};
pub use traits::{GameSessionRepository, RepoResult};
pub use value_objects::{ConnectionId, DoorId, SessionId, UserId};
