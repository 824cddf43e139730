//! Repository implementations

mod error;
mod game_session;
mod memory;

pub use game_session::PgGameSessionRepository;
pub use memory::MemoryGameSessionRepository;

pub(crate) use error::map_db_error;
