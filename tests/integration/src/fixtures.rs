//! Test fixtures
//!
//! Response body mirrors for the REST surface and builders for
//! service-layer contexts backed by the in-memory store.

use std::sync::Arc;

use bbs_common::{RateLimitConfig, RateLimitRule, SessionConfig};
use bbs_core::GameSessionRepository;
use bbs_db::MemoryGameSessionRepository;
use bbs_service::{DoorRegistry, ServiceContext, ServiceContextBuilder, SessionRegistry};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Mirror of the door enter response
#[derive(Debug, Deserialize)]
pub struct EnterResponse {
    pub session_id: String,
    pub output: String,
    pub resumed: bool,
}

/// Mirror of the door input response
#[derive(Debug, Deserialize)]
pub struct InputResponse {
    pub output: String,
    pub exited: bool,
}

/// Mirror of the door exit response
#[derive(Debug, Deserialize)]
pub struct ExitResponse {
    pub output: String,
}

/// Mirror of the door session info response
#[derive(Debug, Deserialize)]
pub struct SessionInfoResponse {
    pub in_door: bool,
    pub has_saved_session: bool,
    pub last_activity: Option<DateTime<Utc>>,
    pub history_len: usize,
}

/// Mirror of the error response body
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Mirror of the health response
#[derive(Debug, Deserialize)]
pub struct HealthBody {
    pub status: String,
    pub connections: usize,
    pub sessions: usize,
}

/// Generous rate limits for tests that are not about limiting
pub fn open_rate_limits() -> RateLimitConfig {
    RateLimitConfig {
        message_post: RateLimitRule {
            max: 1000,
            window_secs: 60,
        },
        door_input: RateLimitRule {
            max: 1000,
            window_secs: 60,
        },
        subscription_change: RateLimitRule {
            max: 1000,
            window_secs: 60,
        },
        http_requests_per_second: 1000,
        http_burst: 1000,
    }
}

/// Build a service context over the in-memory store and built-in doors
pub fn service_context() -> ServiceContext {
    service_context_with(
        SessionConfig {
            timeout_secs: 1800,
            sweep_interval_secs: 60,
        },
        open_rate_limits(),
    )
}

/// Build a service context with custom session and rate limit settings
pub fn service_context_with(
    session: SessionConfig,
    rate_limits: RateLimitConfig,
) -> ServiceContext {
    let store: Arc<dyn GameSessionRepository> = Arc::new(MemoryGameSessionRepository::new());

    ServiceContextBuilder::new()
        .registry(SessionRegistry::new_shared(&session))
        .game_sessions(store)
        .doors(Arc::new(DoorRegistry::with_builtin_doors()))
        .rate_limits(rate_limits)
        .build()
        .expect("test service context should build")
}
