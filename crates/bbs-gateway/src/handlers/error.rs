//! Handler error types

use crate::hub::SubscribeError;
use crate::protocol::CloseCode;
use bbs_core::DomainError;
use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Invalid payload received
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Identity could not be resolved
    #[error("Identity rejected: {0}")]
    IdentityRejected(String),

    /// Not authenticated
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Already authenticated
    #[error("Already authenticated")]
    AlreadyAuthenticated,

    /// Subscription request rejected
    #[error(transparent)]
    Subscribe(#[from] SubscribeError),

    /// Domain error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Close code for errors that terminate the connection
    ///
    /// Errors without a close code are mirrored to the client as an ERROR
    /// dispatch and the connection stays open.
    pub fn to_close_code(&self) -> Option<CloseCode> {
        match self {
            Self::InvalidPayload(_) => Some(CloseCode::DecodeError),
            Self::IdentityRejected(_) => Some(CloseCode::IdentityRejected),
            Self::NotAuthenticated => Some(CloseCode::NotAuthenticated),
            Self::AlreadyAuthenticated => Some(CloseCode::AlreadyAuthenticated),
            Self::Subscribe(_) | Self::Domain(_) => None,
            Self::Internal(_) => Some(CloseCode::UnknownError),
        }
    }

    /// Error code for ERROR dispatches
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::IdentityRejected(_) => "IDENTITY_REJECTED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::AlreadyAuthenticated => "ALREADY_AUTHENTICATED",
            Self::Subscribe(e) => e.code(),
            Self::Domain(e) => e.code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
