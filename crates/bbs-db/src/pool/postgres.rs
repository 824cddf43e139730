//! PostgreSQL connection pool management

use bbs_common::DatabaseConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Maximum wait for a connection before the caller gets
/// `PersistenceUnavailable`
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle time before a pooled connection is closed
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Maximum lifetime of a pooled connection
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Create a connection pool sized by the shared database configuration
///
/// Game session writes are small single-row upserts, so the pool bounds
/// come straight from config and the timeouts are fixed here.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .connect(&config.url)
        .await
}
