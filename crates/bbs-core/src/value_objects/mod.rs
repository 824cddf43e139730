//! Value objects - opaque identifiers used across the domain

mod ids;

pub use ids::{ConnectionId, DoorId, SessionId, UserId};
