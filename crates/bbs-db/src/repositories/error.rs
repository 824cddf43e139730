//! Error handling utilities for repositories

use bbs_core::DomainError;
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
///
/// Every database failure surfaces as `PersistenceUnavailable` because a
/// dropped write-through breaks the resumption guarantee and the caller
/// must be told.
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::PersistenceUnavailable(e.to_string())
}
