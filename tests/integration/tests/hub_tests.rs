//! Notification hub fan-out tests
//!
//! Drive the hub directly with in-process connections and assert on the
//! frames that land in each connection's outbound channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bbs_common::{HubConfig, RateLimitRule};
use bbs_core::{ConnectionId, EventCategory, NotificationEvent, UserId};
use bbs_gateway::connection::Connection;
use bbs_gateway::hub::NotificationHub;
use bbs_gateway::protocol::{GatewayMessage, OpCode, BATCH_EVENT_TYPE};
use bbs_service::RateLimiter;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn hub_config(batch_window_ms: u64, max_batch_size: usize, max_subscriptions: usize) -> HubConfig {
    HubConfig {
        heartbeat_interval_ms: 45_000,
        heartbeat_timeout_ms: 90_000,
        auth_grace_ms: 30_000,
        batch_window_ms,
        max_batch_size,
        max_subscriptions,
    }
}

fn test_hub(config: HubConfig) -> Arc<NotificationHub> {
    let limiter = RateLimiter::new_shared(&RateLimitRule {
        max: 1000,
        window_secs: 60,
    });
    NotificationHub::new_shared(config, limiter)
}

fn test_connection(hub: &NotificationHub) -> (Arc<Connection>, mpsc::Receiver<GatewayMessage>) {
    let (tx, rx) = mpsc::channel(64);
    let conn = Connection::new(ConnectionId::generate(), tx);
    hub.register(Arc::clone(&conn));
    (conn, rx)
}

async fn recv_frame(rx: &mut mpsc::Receiver<GatewayMessage>) -> GatewayMessage {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("timed out waiting for frame")
        .expect("channel closed")
}

/// Flatten a dispatch frame into the payloads it carries, in order
fn frame_payloads(frame: &GatewayMessage) -> Vec<serde_json::Value> {
    assert_eq!(frame.op, OpCode::Dispatch);
    let d = frame.d.as_ref().expect("dispatch without data");
    if frame.t.as_deref() == Some(BATCH_EVENT_TYPE) {
        d.as_array()
            .expect("batch data should be an array")
            .iter()
            .map(|e| e["payload"].clone())
            .collect()
    } else {
        vec![d["payload"].clone()]
    }
}

#[tokio::test]
async fn test_burst_is_coalesced_into_capped_batches() {
    let hub = test_hub(hub_config(10, 3, 16));
    let (conn, mut rx) = test_connection(&hub);
    hub.subscribe(&conn, &[EventCategory::SystemAnnouncement], &HashMap::new())
        .await
        .unwrap();

    for n in 0..7 {
        let accepted = hub
            .broadcast(NotificationEvent::new(
                EventCategory::SystemAnnouncement,
                json!({"n": n}),
            ))
            .await;
        assert_eq!(accepted, 1);
    }

    let mut frames = Vec::new();
    let mut received = 0;
    while received < 7 {
        let frame = recv_frame(&mut rx).await;
        received += frame_payloads(&frame).len();
        frames.push(frame);
    }

    // 7 events over batches of at most 3 fit in ceil(7/3) frames
    assert!(frames.len() <= 3, "got {} frames", frames.len());

    let order: Vec<u64> = frames
        .iter()
        .flat_map(frame_payloads)
        .map(|p| p["n"].as_u64().unwrap())
        .collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4, 5, 6]);

    // sequence numbers are per-connection and strictly increasing
    let seqs: Vec<u64> = frames.iter().map(|f| f.s.unwrap()).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_single_event_is_a_plain_dispatch() {
    let hub = test_hub(hub_config(10, 25, 16));
    let (conn, mut rx) = test_connection(&hub);
    hub.subscribe(&conn, &[EventCategory::SystemAnnouncement], &HashMap::new())
        .await
        .unwrap();

    hub.broadcast(NotificationEvent::new(
        EventCategory::SystemAnnouncement,
        json!({"text": "lights out"}),
    ))
    .await;

    let frame = recv_frame(&mut rx).await;
    assert_eq!(frame.t.as_deref(), Some("SYSTEM_ANNOUNCEMENT"));
    assert_eq!(frame.s, Some(1));
}

#[tokio::test]
async fn test_subscription_cap_preserves_existing_delivery() {
    let hub = test_hub(hub_config(10, 25, 2));
    let (conn, mut rx) = test_connection(&hub);

    hub.subscribe(
        &conn,
        &[EventCategory::SystemAnnouncement, EventCategory::UserJoined],
        &HashMap::new(),
    )
    .await
    .unwrap();

    let err = hub
        .subscribe(&conn, &[EventCategory::UserLeft], &HashMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "SUBSCRIPTION_LIMIT_EXCEEDED");

    // the rejected request did not disturb what was already subscribed
    let accepted = hub
        .broadcast(NotificationEvent::new(
            EventCategory::UserJoined,
            json!({"user_id": "bob"}),
        ))
        .await;
    assert_eq!(accepted, 1);
    let frame = recv_frame(&mut rx).await;
    assert_eq!(frame.t.as_deref(), Some("USER_JOINED"));

    let accepted = hub
        .broadcast(NotificationEvent::new(
            EventCategory::UserLeft,
            json!({"user_id": "bob"}),
        ))
        .await;
    assert_eq!(accepted, 0);
}

#[tokio::test]
async fn test_resubscribe_to_held_category_is_not_counted() {
    let hub = test_hub(hub_config(10, 25, 1));
    let (conn, _rx) = test_connection(&hub);

    hub.subscribe(&conn, &[EventCategory::MessageNew], &HashMap::new())
        .await
        .unwrap();

    // same category again, now with a filter; replaces rather than adds
    let filters = HashMap::from([("board_id".to_string(), "tech".to_string())]);
    hub.subscribe(&conn, &[EventCategory::MessageNew], &filters)
        .await
        .unwrap();

    assert_eq!(conn.subscription_count().await, 1);
}

#[tokio::test]
async fn test_board_filter_narrows_delivery() {
    let hub = test_hub(hub_config(10, 25, 16));
    let (general, mut general_rx) = test_connection(&hub);
    let (tech, mut tech_rx) = test_connection(&hub);

    let general_filter = HashMap::from([("board_id".to_string(), "general".to_string())]);
    hub.subscribe(&general, &[EventCategory::MessageNew], &general_filter)
        .await
        .unwrap();
    let tech_filter = HashMap::from([("board_id".to_string(), "tech".to_string())]);
    hub.subscribe(&tech, &[EventCategory::MessageNew], &tech_filter)
        .await
        .unwrap();

    let accepted = hub
        .broadcast(NotificationEvent::new(
            EventCategory::MessageNew,
            json!({"board_id": "general", "body": "hello all"}),
        ))
        .await;
    assert_eq!(accepted, 1);

    let frame = recv_frame(&mut general_rx).await;
    assert_eq!(frame.t.as_deref(), Some("MESSAGE_NEW"));

    // the tech subscriber saw nothing
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(tech_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_door_events_require_identity() {
    let hub = test_hub(hub_config(10, 25, 16));
    let (conn, _rx) = test_connection(&hub);

    let err = hub
        .subscribe(&conn, &[EventCategory::DoorStateChanged], &HashMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_AUTHENTICATED");

    conn.set_identity(UserId::new("alice"), "Alice").await;
    hub.subscribe(&conn, &[EventCategory::DoorStateChanged], &HashMap::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_subscription_churn_is_limited() {
    let limiter = RateLimiter::new_shared(&RateLimitRule {
        max: 2,
        window_secs: 60,
    });
    let hub = NotificationHub::new_shared(hub_config(10, 25, 16), limiter);
    let (conn, _rx) = test_connection(&hub);

    hub.subscribe(&conn, &[EventCategory::UserJoined], &HashMap::new())
        .await
        .unwrap();
    hub.unsubscribe(&conn, &[EventCategory::UserJoined]).await.unwrap();

    let err = hub
        .subscribe(&conn, &[EventCategory::UserJoined], &HashMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "SUBSCRIPTION_RATE_LIMITED");
}
