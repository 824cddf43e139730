//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;

use crate::entities::{GameSessionRecord, InteractionEntry};
use crate::error::DomainError;
use crate::value_objects::{DoorId, UserId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

/// Durable store for door-session snapshots
///
/// Implementations must uphold the one-active-record-per-(user, door)
/// invariant; the orchestrator relies on it for resumption.
#[async_trait]
pub trait GameSessionRepository: Send + Sync {
    /// Persist a fresh record
    async fn create(&self, record: &GameSessionRecord) -> RepoResult<()>;

    /// Find the active record for a (user, door) pair
    async fn get_active(
        &self,
        user_id: &UserId,
        door_id: &DoorId,
    ) -> RepoResult<Option<GameSessionRecord>>;

    /// Write-through checkpoint of state and history
    async fn update(
        &self,
        id: &str,
        state: &serde_json::Value,
        history: &[InteractionEntry],
    ) -> RepoResult<()>;

    /// Delete a record on explicit exit
    async fn delete(&self, id: &str) -> RepoResult<()>;

    /// Administrative reclaim of every record a user owns
    async fn delete_all_for_user(&self, user_id: &UserId) -> RepoResult<u64>;
}
