//! Response types and error handling for the stateless HTTP surface
//!
//! Provides unified error handling and JSON response formatting. Both
//! transports report errors with the same code vocabulary; here they land
//! as an `ErrorResponse` body with a matching HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bbs_common::{AppError, ErrorResponse};
use bbs_core::DomainError;
use bbs_service::ServiceError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

/// API error type for consistent error responses
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    App(#[from] AppError),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::App(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Service(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Domain(e) => {
                if e.is_not_found() {
                    StatusCode::NOT_FOUND
                } else if e.is_conflict() {
                    StatusCode::CONFLICT
                } else if e.is_rate_limited() {
                    StatusCode::TOO_MANY_REQUESTS
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
            Self::Validation(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &str {
        match self {
            Self::App(e) => e.error_code(),
            Self::Service(e) => e.error_code(),
            Self::Domain(e) => e.code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation(errors) => serde_json::to_value(errors).ok(),
            Self::Service(e) => e
                .retry_in_secs()
                .map(|secs| serde_json::json!({ "retry_in_secs": secs })),
            Self::Domain(
                DomainError::RateLimitExceeded { retry_in_secs, .. }
                | DomainError::SubscriptionRateLimited { retry_in_secs },
            ) => Some(serde_json::json!({ "retry_in_secs": retry_in_secs })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = ?self, "Server error occurred");
        }

        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

/// Wrapper for successful JSON responses
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

/// Created response (201) with JSON body
pub struct Created<T>(pub T);

impl<T: IntoResponse> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        let mut response = self.0.into_response();
        *response.status_mut() = StatusCode::CREATED;
        response
    }
}

/// No content response (204)
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbs_core::{DoorId, SessionId, UserId};

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::App(AppError::MissingIdentity).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Domain(DomainError::DoorNotFound(DoorId::new("nope"))).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Domain(DomainError::SessionOwnershipMismatch {
                session_id: SessionId::new("s"),
                user_id: UserId::new("u"),
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Domain(DomainError::RateLimitExceeded {
                key: "post:alice".into(),
                retry_in_secs: 9,
            })
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_rate_limit_details_carry_retry() {
        let err = ApiError::Domain(DomainError::RateLimitExceeded {
            key: "post:alice".into(),
            retry_in_secs: 9,
        });
        assert_eq!(
            err.details(),
            Some(serde_json::json!({ "retry_in_secs": 9 }))
        );
    }

    #[test]
    fn test_api_error_codes() {
        assert_eq!(
            ApiError::InvalidBody("bad".into()).error_code(),
            "INVALID_BODY"
        );
        assert_eq!(
            ApiError::Domain(DomainError::DoorNotFound(DoorId::new("nope"))).error_code(),
            "DOOR_NOT_FOUND"
        );
    }
}
