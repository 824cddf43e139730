//! Database models with SQLx `FromRow` derives

mod game_session;

pub use game_session::GameSessionModel;
