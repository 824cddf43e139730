//! # bbs-db
//!
//! Persistence layer implementing the `GameSessionRepository` trait from
//! `bbs-core`. Two implementations ship:
//!
//! - `PgGameSessionRepository` - PostgreSQL via SQLx with JSONB state/history
//! - `MemoryGameSessionRepository` - DashMap-backed, for tests and local runs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bbs_common::AppConfig;
//! use bbs_db::{create_pool, PgGameSessionRepository};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let pool = create_pool(&config.database).await?;
//!     let repo = PgGameSessionRepository::new(pool);
//!
//!     // Use the repository...
//!     Ok(())
//! }
//! ```

pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, PgPool};
pub use repositories::{MemoryGameSessionRepository, PgGameSessionRepository};
