//! Stateless HTTP surface
//!
//! JSON routes under `/api/v1` sharing the registry, orchestrator, and hub
//! with the streaming transport.

mod doors;
mod extractors;
mod health;
mod messages;
mod response;

pub use extractors::{Identity, ValidatedJson};
pub use response::{ApiError, ApiJson, ApiResult, Created, NoContent};

use axum::routing::{get, post};
use axum::Router;

use crate::server::GatewayState;

/// Build the `/api/v1` router
pub fn api_routes() -> Router<GatewayState> {
    Router::new()
        .route("/doors", get(doors::list_doors))
        .route("/doors/:door_id/enter", post(doors::enter_door))
        .route("/doors/:door_id/input", post(doors::door_input))
        .route("/doors/:door_id/exit", post(doors::exit_door))
        .route("/doors/:door_id/session", get(doors::door_session_info))
        .route("/boards/:board_id/messages", post(messages::post_message))
        .route("/announcements", post(messages::post_announcement))
}

/// Build the health router
pub fn health_routes() -> Router<GatewayState> {
    Router::new().route("/health", get(health::health))
}
