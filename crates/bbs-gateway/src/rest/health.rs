//! Health check route

use axum::extract::State;
use serde::Serialize;

use crate::rest::ApiJson;
use crate::server::GatewayState;

/// Response for `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Registered WebSocket connections
    pub connections: usize,
    /// Live registry sessions (streaming and stateless)
    pub sessions: usize,
}

/// Report process liveness and basic gauges
pub async fn health(State(state): State<GatewayState>) -> ApiJson<HealthResponse> {
    ApiJson(HealthResponse {
        status: "ok",
        connections: state.hub().connection_count(),
        sessions: state.service_context().registry().len(),
    })
}
