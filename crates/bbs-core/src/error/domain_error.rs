//! Domain errors - error types for the domain layer
//!
//! "Absent" lookups are modeled as `Option`, not errors; everything here is
//! a recoverable condition the caller is expected to react to. No variant
//! should ever terminate the owning process.

use thiserror::Error;

use crate::value_objects::{DoorId, SessionId, UserId};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Session {session_id} does not belong to user {user_id}")]
    SessionOwnershipMismatch {
        session_id: SessionId,
        user_id: UserId,
    },

    #[error("Invalid session state: expected {expected}, found {actual}")]
    InvalidSessionState {
        expected: &'static str,
        actual: String,
    },

    // =========================================================================
    // Door Errors
    // =========================================================================
    #[error("Door not found: {0}")]
    DoorNotFound(DoorId),

    // =========================================================================
    // Subscription Errors
    // =========================================================================
    #[error("Subscription limit exceeded: max {max} per connection")]
    SubscriptionLimitExceeded { max: usize },

    #[error("Subscription changes rate limited, retry in {retry_in_secs}s")]
    SubscriptionRateLimited { retry_in_secs: u64 },

    // =========================================================================
    // Rate Limiting
    // =========================================================================
    #[error("Rate limit exceeded for {key}, retry in {retry_in_secs}s")]
    RateLimitExceeded { key: String, retry_in_secs: u64 },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses and ERROR dispatches
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::SessionOwnershipMismatch { .. } => "SESSION_OWNERSHIP_MISMATCH",
            Self::InvalidSessionState { .. } => "INVALID_SESSION_STATE",
            Self::DoorNotFound(_) => "DOOR_NOT_FOUND",
            Self::SubscriptionLimitExceeded { .. } => "SUBSCRIPTION_LIMIT_EXCEEDED",
            Self::SubscriptionRateLimited { .. } => "SUBSCRIPTION_RATE_LIMITED",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::PersistenceUnavailable(_) => "PERSISTENCE_UNAVAILABLE",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound(_) | Self::DoorNotFound(_))
    }

    /// Check if this is an ownership or state violation
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::SessionOwnershipMismatch { .. } | Self::InvalidSessionState { .. }
        )
    }

    /// Check if this is a rate-limit rejection
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. }
                | Self::SubscriptionRateLimited { .. }
                | Self::SubscriptionLimitExceeded { .. }
        )
    }

    /// Check if this is an infrastructure failure
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::PersistenceUnavailable(_) | Self::InternalError(_)
        )
    }
}
