//! Message and announcement routes
//!
//! Board storage is external; the post route only rate-limits and emits the
//! MESSAGE_NEW event for subscribers.

use axum::extract::{Path, State};
use bbs_core::{DomainError, EventCategory, NotificationEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::rest::{ApiJson, ApiResult, Created, Identity, ValidatedJson};
use crate::server::GatewayState;

/// Request body for `POST /api/v1/boards/{board_id}/messages`
#[derive(Debug, Deserialize, Validate)]
pub struct PostMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "body must be 1-2000 characters"))]
    pub body: String,
}

/// Response for a posted message
#[derive(Debug, Serialize)]
pub struct PostMessageResponse {
    pub message_id: String,
    pub board_id: String,
    pub posted_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/announcements`
#[derive(Debug, Deserialize, Validate)]
pub struct AnnouncementRequest {
    #[validate(length(min = 1, max = 1000, message = "text must be 1-1000 characters"))]
    pub text: String,
}

/// Response for an announcement
#[derive(Debug, Serialize)]
pub struct AnnouncementResponse {
    /// Connections the announcement was accepted for
    pub accepted: usize,
}

/// Post a message to a board and notify subscribers
pub async fn post_message(
    State(state): State<GatewayState>,
    Path(board_id): Path<String>,
    identity: Identity,
    ValidatedJson(request): ValidatedJson<PostMessageRequest>,
) -> ApiResult<Created<ApiJson<PostMessageResponse>>> {
    let limiter = state.service_context().message_limiter();
    let key = format!("post:{}", identity.user_id);
    if !limiter.check(&key) {
        let retry_in_secs = limiter.reset_in_seconds(&key);
        return Err(DomainError::RateLimitExceeded { key, retry_in_secs }.into());
    }

    let message_id = Uuid::new_v4().to_string();
    let posted_at = Utc::now();

    state
        .hub()
        .broadcast(NotificationEvent::new(
            EventCategory::MessageNew,
            serde_json::json!({
                "board_id": board_id,
                "message_id": message_id,
                "user_id": identity.user_id.to_string(),
                "handle": identity.handle,
                "body": request.body,
            }),
        ))
        .await;

    tracing::info!(
        board_id = %board_id,
        user_id = %identity.user_id,
        message_id = %message_id,
        "Message posted"
    );

    Ok(Created(ApiJson(PostMessageResponse {
        message_id,
        board_id,
        posted_at,
    })))
}

/// Broadcast a system announcement
pub async fn post_announcement(
    State(state): State<GatewayState>,
    identity: Identity,
    ValidatedJson(request): ValidatedJson<AnnouncementRequest>,
) -> ApiResult<ApiJson<AnnouncementResponse>> {
    let accepted = state
        .hub()
        .broadcast(NotificationEvent::new(
            EventCategory::SystemAnnouncement,
            serde_json::json!({
                "text": request.text,
                "issued_by": identity.user_id.to_string(),
            }),
        ))
        .await;

    tracing::info!(
        issued_by = %identity.user_id,
        accepted = accepted,
        "Announcement broadcast"
    );

    Ok(ApiJson(AnnouncementResponse { accepted }))
}
