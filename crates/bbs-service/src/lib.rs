//! # bbs-service
//!
//! Application layer: the in-memory session registry and its sweep, the
//! fixed-window rate limiter, the door registry with built-in doors, and
//! the door orchestrator tying live sessions to durable game records.

pub mod doors;
pub mod rate_limit;
pub mod registry;
pub mod services;

// Re-export commonly used types at crate root
pub use doors::{DoorRegistry, HiLoDoor, OracleDoor};
pub use rate_limit::RateLimiter;
pub use registry::SessionRegistry;
pub use services::{
    DoorOrchestrator, DoorSessionInfo, EnterOutcome, ExitOutcome, InputOutcome, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult,
};
