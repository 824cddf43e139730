//! Gateway server setup
//!
//! Builds the axum application serving both transports: the `/gateway`
//! WebSocket and the `/api/v1` stateless routes.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use crate::hub::NotificationHub;
use crate::rest;
use axum::{routing::get, Router};
use bbs_common::{AppConfig, AppError};
use bbs_core::GameSessionRepository;
use bbs_service::{DoorRegistry, ServiceContextBuilder, SessionRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer,
};
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .nest("/api/v1", rest::api_routes())
        .merge(rest::health_routes())
}

/// Build the complete application with middleware
pub fn create_app(state: GatewayState) -> Router {
    let rate_limit = &state.config().rate_limit;

    // Global transport-level limit; feature-specific limits live in the
    // service layer keyed per user.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(rate_limit.http_requests_per_second)
            .burst_size(rate_limit.http_burst)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .expect("Failed to create rate limiter configuration"),
    );

    create_router()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    let game_sessions: Arc<dyn GameSessionRepository> = if config.database.url.starts_with("memory")
    {
        tracing::info!("Using in-memory game session store");
        Arc::new(bbs_db::MemoryGameSessionRepository::new())
    } else {
        tracing::info!("Connecting to PostgreSQL...");
        let pool = bbs_db::create_pool(&config.database)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        tracing::info!("PostgreSQL connection established");
        Arc::new(bbs_db::PgGameSessionRepository::new(pool))
    };

    let registry = SessionRegistry::new_shared(&config.session);
    let doors = Arc::new(DoorRegistry::with_builtin_doors());

    let service_context = ServiceContextBuilder::new()
        .registry(registry)
        .game_sessions(game_sessions)
        .doors(doors)
        .rate_limits(config.rate_limit.clone())
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    let hub = NotificationHub::new_shared(
        config.hub.clone(),
        service_context.subscription_limiter_handle(),
    );

    let state = GatewayState::new(service_context, hub, config);
    state.start_background_tasks();

    Ok(state)
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config
        .server
        .address()
        .parse::<SocketAddr>()
        .map_err(|e| AppError::Config(format!("Invalid server address: {e}")))?;

    let state = create_gateway_state(config).await?;
    let app = create_app(state);

    run_server(app, addr).await
}
