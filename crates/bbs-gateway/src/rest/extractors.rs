//! Request extractors
//!
//! Identity headers and validated JSON bodies for the stateless surface.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use bbs_common::AppError;
use bbs_core::UserId;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::rest::ApiError;

/// Caller identity resolved by the upstream collaborator
///
/// Carried on every request as `X-User-Id` and `X-Handle` headers. The
/// gateway trusts them; no credential check happens here.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub handle: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, "x-user-id")?.ok_or(AppError::MissingIdentity)?;
        if user_id.trim().is_empty() {
            return Err(AppError::InvalidIdentity("X-User-Id is empty".to_string()).into());
        }

        // handle defaults to the user id when the header is absent
        let handle = header_value(parts, "x-handle")?
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| user_id.clone());

        Ok(Identity {
            user_id: UserId::new(user_id.trim()),
            handle: handle.trim().to_string(),
        })
    }
}

fn header_value(parts: &Parts, name: &str) -> Result<Option<String>, ApiError> {
    match parts.headers.get(name) {
        Some(value) => {
            let s = value
                .to_str()
                .map_err(|_| AppError::InvalidIdentity(format!("{name} is not valid UTF-8")))?;
            Ok(Some(s.to_string()))
        }
        None => Ok(None),
    }
}

/// Validated JSON extractor
///
/// Extracts a JSON body and validates it using the `validator` crate.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            let message = match e {
                JsonRejection::JsonDataError(e) => e.to_string(),
                JsonRejection::JsonSyntaxError(e) => e.to_string(),
                JsonRejection::MissingJsonContentType(e) => e.to_string(),
                _ => "Invalid JSON body".to_string(),
            };
            ApiError::InvalidBody(message)
        })?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = HttpRequest::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_identity_from_headers() {
        let mut parts = parts_with_headers(&[("x-user-id", "alice"), ("x-handle", "Alice")]);
        let identity = Identity::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(identity.user_id, UserId::new("alice"));
        assert_eq!(identity.handle, "Alice");
    }

    #[tokio::test]
    async fn test_identity_handle_defaults_to_user_id() {
        let mut parts = parts_with_headers(&[("x-user-id", "alice")]);
        let identity = Identity::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(identity.handle, "alice");
    }

    #[tokio::test]
    async fn test_missing_identity_rejected() {
        let mut parts = parts_with_headers(&[]);
        let err = Identity::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_IDENTITY");
    }

    #[tokio::test]
    async fn test_blank_user_id_rejected() {
        let mut parts = parts_with_headers(&[("x-user-id", "  ")]);
        let err = Identity::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_IDENTITY");
    }
}
