//! Door routes
//!
//! Stateless door access: enter, input, exit, and session info. Each
//! successful state change emits a DOOR_STATE_CHANGED event to subscribers.

use axum::extract::{Path, State};
use bbs_core::{DoorId, EventCategory, NotificationEvent, UserId};
use bbs_service::{DoorOrchestrator, DoorSessionInfo, EnterOutcome, ExitOutcome, InputOutcome};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::rest::{ApiJson, ApiResult, Identity, ValidatedJson};
use crate::server::GatewayState;

/// One entry in the door list
#[derive(Debug, Serialize)]
pub struct DoorSummary {
    pub id: String,
    pub name: String,
}

/// Response for `GET /api/v1/doors`
#[derive(Debug, Serialize)]
pub struct DoorListResponse {
    pub doors: Vec<DoorSummary>,
}

/// Request body for `POST /api/v1/doors/{door_id}/input`
#[derive(Debug, Deserialize, Validate)]
pub struct DoorInputRequest {
    #[validate(length(min = 1, max = 512, message = "input must be 1-512 characters"))]
    pub input: String,
}

/// List the installed doors
pub async fn list_doors(State(state): State<GatewayState>) -> ApiJson<DoorListResponse> {
    let registry = state.service_context().doors();
    let doors = registry
        .ids()
        .into_iter()
        .filter_map(|id| {
            registry.get(&id).map(|door| DoorSummary {
                id: id.to_string(),
                name: door.name().to_string(),
            })
        })
        .collect();

    ApiJson(DoorListResponse { doors })
}

/// Enter a door, resuming any saved session
pub async fn enter_door(
    State(state): State<GatewayState>,
    Path(door_id): Path<String>,
    identity: Identity,
) -> ApiResult<ApiJson<EnterOutcome>> {
    let door_id = DoorId::new(door_id);
    let orchestrator = DoorOrchestrator::new(state.service_context());

    let outcome = orchestrator
        .enter(&identity.user_id, &identity.handle, &door_id)
        .await?;

    emit_door_event(
        &state,
        &door_id,
        &identity.user_id,
        if outcome.resumed { "resumed" } else { "entered" },
    )
    .await;

    Ok(ApiJson(outcome))
}

/// Feed one line of input to a door
pub async fn door_input(
    State(state): State<GatewayState>,
    Path(door_id): Path<String>,
    identity: Identity,
    ValidatedJson(request): ValidatedJson<DoorInputRequest>,
) -> ApiResult<ApiJson<InputOutcome>> {
    let door_id = DoorId::new(door_id);
    let orchestrator = DoorOrchestrator::new(state.service_context());

    let outcome = orchestrator
        .send_input(&identity.user_id, &door_id, &request.input, None)
        .await?;

    emit_door_event(
        &state,
        &door_id,
        &identity.user_id,
        if outcome.exited { "exited" } else { "progressed" },
    )
    .await;

    Ok(ApiJson(outcome))
}

/// Leave a door, discarding the saved session
pub async fn exit_door(
    State(state): State<GatewayState>,
    Path(door_id): Path<String>,
    identity: Identity,
) -> ApiResult<ApiJson<ExitOutcome>> {
    let door_id = DoorId::new(door_id);
    let orchestrator = DoorOrchestrator::new(state.service_context());

    let outcome = orchestrator.exit(&identity.user_id, &door_id, None).await?;

    emit_door_event(&state, &door_id, &identity.user_id, "exited").await;

    Ok(ApiJson(outcome))
}

/// Report the caller's standing with a door
pub async fn door_session_info(
    State(state): State<GatewayState>,
    Path(door_id): Path<String>,
    identity: Identity,
) -> ApiResult<ApiJson<DoorSessionInfo>> {
    let door_id = DoorId::new(door_id);
    let orchestrator = DoorOrchestrator::new(state.service_context());

    let info = orchestrator
        .session_info(&identity.user_id, &door_id)
        .await?;

    Ok(ApiJson(info))
}

async fn emit_door_event(state: &GatewayState, door_id: &DoorId, user_id: &UserId, status: &str) {
    state
        .hub()
        .broadcast_to_authenticated(NotificationEvent::new(
            EventCategory::DoorStateChanged,
            serde_json::json!({
                "door_id": door_id.to_string(),
                "user_id": user_id.to_string(),
                "status": status,
            }),
        ))
        .await;
}
