//! REST API integration tests
//!
//! Each test spawns a full gateway over the in-memory game session store,
//! so no external services are required.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use bbs_common::RateLimitRule;
use bbs_core::SessionId;
use integration_tests::fixtures::{
    EnterResponse, ErrorBody, ExitResponse, HealthBody, InputResponse, SessionInfoResponse,
};
use integration_tests::helpers::{assert_json, assert_status, test_config, TestServer};
use reqwest::StatusCode;
use serde_json::json;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_reports_counters() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/health").await.expect("Request failed");
    let body: HealthBody = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body.status, "ok");
    assert_eq!(body.connections, 0);
    assert_eq!(body.sessions, 0);
}

// ============================================================================
// Identity
// ============================================================================

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post_anonymous("/api/v1/doors/oracle/enter", &json!({}))
        .await
        .expect("Request failed");
    let body: ErrorBody = assert_json(response, StatusCode::UNAUTHORIZED)
        .await
        .unwrap();

    assert_eq!(body.code, "MISSING_IDENTITY");
}

#[tokio::test]
async fn test_blank_identity_is_rejected() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .client
        .post(format!("{}/api/v1/doors/oracle/enter", server.base_url()))
        .header("x-user-id", "  ")
        .send()
        .await
        .expect("Request failed");
    let body: ErrorBody = assert_json(response, StatusCode::UNAUTHORIZED)
        .await
        .unwrap();

    assert_eq!(body.code, "INVALID_IDENTITY");
}

// ============================================================================
// Doors
// ============================================================================

#[tokio::test]
async fn test_list_doors_includes_builtins() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .get_as("alice", "/api/v1/doors")
        .await
        .expect("Request failed");
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();

    let ids: Vec<&str> = body["doors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["id"].as_str())
        .collect();
    assert!(ids.contains(&"oracle"));
    assert!(ids.contains(&"hilo"));
}

#[tokio::test]
async fn test_unknown_door_is_not_found() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post_empty_as("alice", "/api/v1/doors/tradewars/enter")
        .await
        .expect("Request failed");
    let body: ErrorBody = assert_json(response, StatusCode::NOT_FOUND).await.unwrap();

    assert_eq!(body.code, "DOOR_NOT_FOUND");
}

#[tokio::test]
async fn test_door_flow_enter_input_exit() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post_empty_as("alice", "/api/v1/doors/oracle/enter")
        .await
        .expect("Request failed");
    let entered: EnterResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!entered.resumed);
    assert!(entered.output.contains("dim chamber"));

    let response = server
        .post_as(
            "alice",
            "/api/v1/doors/oracle/input",
            &json!({"input": "will it rain tomorrow?"}),
        )
        .await
        .expect("Request failed");
    let progressed: InputResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!progressed.exited);

    let response = server
        .post_empty_as("alice", "/api/v1/doors/oracle/exit")
        .await
        .expect("Request failed");
    let exited: ExitResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(exited.output.contains("1 question(s)"));

    let response = server
        .get_as("alice", "/api/v1/doors/oracle/session")
        .await
        .expect("Request failed");
    let info: SessionInfoResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!info.in_door);
    assert!(!info.has_saved_session);
}

#[tokio::test]
async fn test_door_session_resumes_after_drop() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post_empty_as("alice", "/api/v1/doors/oracle/enter")
        .await
        .expect("Request failed");
    let entered: EnterResponse = assert_json(response, StatusCode::OK).await.unwrap();

    server
        .post_as(
            "alice",
            "/api/v1/doors/oracle/input",
            &json!({"input": "is the line stable?"}),
        )
        .await
        .expect("Request failed");

    // simulate the connection drop that evicts the live session
    server
        .state
        .service_context()
        .registry()
        .remove(&SessionId::new(&entered.session_id));

    let response = server
        .get_as("alice", "/api/v1/doors/oracle/session")
        .await
        .expect("Request failed");
    let info: SessionInfoResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!info.in_door);
    assert!(info.has_saved_session);
    assert_eq!(info.history_len, 1);
    assert!(info.last_activity.is_some());

    let response = server
        .post_empty_as("alice", "/api/v1/doors/oracle/enter")
        .await
        .expect("Request failed");
    let resumed: EnterResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(resumed.resumed);
    assert!(resumed.output.starts_with("[Resuming your previous session]"));
}

#[tokio::test]
async fn test_empty_door_input_is_rejected() {
    let server = TestServer::start().await.expect("Failed to start server");

    server
        .post_empty_as("alice", "/api/v1/doors/oracle/enter")
        .await
        .expect("Request failed");

    let response = server
        .post_as("alice", "/api/v1/doors/oracle/input", &json!({"input": ""}))
        .await
        .expect("Request failed");
    let body: ErrorBody = assert_json(response, StatusCode::BAD_REQUEST)
        .await
        .unwrap();

    assert_eq!(body.code, "VALIDATION_ERROR");
    assert!(body.details.is_some());
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_post_message_created() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post_as(
            "alice",
            "/api/v1/boards/general/messages",
            &json!({"body": "anyone remember 2400 baud?"}),
        )
        .await
        .expect("Request failed");
    let body: serde_json::Value = assert_json(response, StatusCode::CREATED).await.unwrap();

    assert_eq!(body["board_id"], "general");
    assert!(body["message_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_post_message_rate_limited() {
    let mut config = test_config();
    config.rate_limit.message_post = RateLimitRule {
        max: 2,
        window_secs: 60,
    };
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");

    for _ in 0..2 {
        let response = server
            .post_as(
                "alice",
                "/api/v1/boards/general/messages",
                &json!({"body": "hello"}),
            )
            .await
            .expect("Request failed");
        assert_status(response, StatusCode::CREATED).await.unwrap();
    }

    let response = server
        .post_as(
            "alice",
            "/api/v1/boards/general/messages",
            &json!({"body": "hello again"}),
        )
        .await
        .expect("Request failed");
    let body: ErrorBody = assert_json(response, StatusCode::TOO_MANY_REQUESTS)
        .await
        .unwrap();

    assert_eq!(body.code, "RATE_LIMIT_EXCEEDED");
    let details = body.details.expect("details should carry retry hint");
    assert!(details["retry_in_secs"].as_u64().is_some());

    // other users are not affected
    let response = server
        .post_as(
            "bob",
            "/api/v1/boards/general/messages",
            &json!({"body": "still here"}),
        )
        .await
        .expect("Request failed");
    assert_status(response, StatusCode::CREATED).await.unwrap();
}

#[tokio::test]
async fn test_announcement_accepted() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post_as(
            "sysop",
            "/api/v1/announcements",
            &json!({"text": "Maintenance at midnight."}),
        )
        .await
        .expect("Request failed");
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();

    // no gateway connections are registered, so nothing was delivered
    assert_eq!(body["accepted"], 0);
}
