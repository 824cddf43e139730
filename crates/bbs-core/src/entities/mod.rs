//! Domain entities

mod game_session;
mod session;

pub use game_session::{GameSessionRecord, InteractionEntry};
pub use session::{
    Session, SessionPatch, SessionState, DATA_ACTIVE_DOOR, DATA_DOOR_HISTORY, DATA_DOOR_STATE,
};
