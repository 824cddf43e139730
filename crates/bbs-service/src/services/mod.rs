//! Service layer - orchestration over the registries and the durable store

mod context;
mod door_orchestrator;
mod error;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use door_orchestrator::{
    DoorOrchestrator, DoorSessionInfo, EnterOutcome, ExitOutcome, InputOutcome,
};
pub use error::{ServiceError, ServiceResult};
