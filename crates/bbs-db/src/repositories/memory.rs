//! In-memory implementation of GameSessionRepository
//!
//! Backs tests and local runs that have no PostgreSQL available. Uphold the
//! same contract as the Postgres implementation: one active record per
//! (user, door) pair.

use async_trait::async_trait;
use dashmap::DashMap;

use bbs_core::{
    DomainError, DoorId, GameSessionRecord, GameSessionRepository, InteractionEntry, RepoResult,
    UserId,
};

/// DashMap-backed game session store
///
/// Keyed by record id, with lookups scanning for the (user, door) pair; the
/// store is small enough that an index is not worth the bookkeeping.
#[derive(Default)]
pub struct MemoryGameSessionRepository {
    records: DashMap<String, GameSessionRecord>,
}

impl MemoryGameSessionRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records (test introspection)
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl GameSessionRepository for MemoryGameSessionRepository {
    async fn create(&self, record: &GameSessionRecord) -> RepoResult<()> {
        let duplicate = self.records.iter().any(|r| {
            r.user_id == record.user_id && r.door_id == record.door_id && r.id != record.id
        });
        if duplicate {
            return Err(DomainError::InternalError(format!(
                "active record already exists for ({}, {})",
                record.user_id, record.door_id
            )));
        }

        self.records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get_active(
        &self,
        user_id: &UserId,
        door_id: &DoorId,
    ) -> RepoResult<Option<GameSessionRecord>> {
        Ok(self
            .records
            .iter()
            .find(|r| &r.user_id == user_id && &r.door_id == door_id)
            .map(|r| r.value().clone()))
    }

    async fn update(
        &self,
        id: &str,
        state: &serde_json::Value,
        history: &[InteractionEntry],
    ) -> RepoResult<()> {
        if let Some(mut record) = self.records.get_mut(id) {
            record.checkpoint(state.clone(), history.to_vec());
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        self.records.remove(id);
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> RepoResult<u64> {
        let before = self.records.len();
        self.records.retain(|_, r| &r.user_id != user_id);
        Ok((before - self.records.len()) as u64)
    }
}
