//! Door session resumption tests
//!
//! Exercise the orchestrator end to end over the in-memory store: enter,
//! progress, drop the live session, and resume.

use bbs_core::{DoorId, UserId};
use bbs_service::DoorOrchestrator;
use integration_tests::fixtures::service_context;

fn alice() -> UserId {
    UserId::new("alice")
}

fn oracle() -> DoorId {
    DoorId::new("oracle")
}

#[tokio::test]
async fn test_double_enter_resumes_single_live_session() {
    let ctx = service_context();
    let orchestrator = DoorOrchestrator::new(&ctx);

    let first = orchestrator.enter(&alice(), "Alice", &oracle()).await.unwrap();
    assert!(!first.resumed);

    let second = orchestrator.enter(&alice(), "Alice", &oracle()).await.unwrap();
    assert!(second.resumed);
    assert_eq!(first.session_id, second.session_id);

    // one live session, one saved record
    assert_eq!(ctx.registry().len(), 1);
}

#[tokio::test]
async fn test_drop_and_reenter_restores_state_and_history() {
    let ctx = service_context();
    let orchestrator = DoorOrchestrator::new(&ctx);

    let entered = orchestrator.enter(&alice(), "Alice", &oracle()).await.unwrap();
    orchestrator
        .send_input(&alice(), &oracle(), "will it rain?", None)
        .await
        .unwrap();
    orchestrator
        .send_input(&alice(), &oracle(), "are you sure?", None)
        .await
        .unwrap();

    // simulate a connection drop that evicts the live session
    ctx.registry().remove(&entered.session_id);
    assert_eq!(ctx.registry().len(), 0);

    let info = orchestrator.session_info(&alice(), &oracle()).await.unwrap();
    assert!(!info.in_door);
    assert!(info.has_saved_session);
    assert_eq!(info.history_len, 2);

    let resumed = orchestrator.enter(&alice(), "Alice", &oracle()).await.unwrap();
    assert!(resumed.resumed);
    assert!(resumed.output.starts_with("[Resuming your previous session]"));
    // state restored: the oracle remembers both questions
    assert!(resumed.output.contains("2 question(s)"));

    let info = orchestrator.session_info(&alice(), &oracle()).await.unwrap();
    assert!(info.in_door);
    assert_eq!(info.history_len, 2);
}

#[tokio::test]
async fn test_exit_discards_saved_session() {
    let ctx = service_context();
    let orchestrator = DoorOrchestrator::new(&ctx);

    orchestrator.enter(&alice(), "Alice", &oracle()).await.unwrap();
    orchestrator
        .send_input(&alice(), &oracle(), "anything there?", None)
        .await
        .unwrap();

    orchestrator.exit(&alice(), &oracle(), None).await.unwrap();

    let info = orchestrator.session_info(&alice(), &oracle()).await.unwrap();
    assert!(!info.in_door);
    assert!(!info.has_saved_session);

    // next enter starts fresh
    let entered = orchestrator.enter(&alice(), "Alice", &oracle()).await.unwrap();
    assert!(!entered.resumed);
}

#[tokio::test]
async fn test_hilo_round_survives_drop() {
    let ctx = service_context();
    let orchestrator = DoorOrchestrator::new(&ctx);
    let hilo = DoorId::new("hilo");

    let entered = orchestrator.enter(&alice(), "Alice", &hilo).await.unwrap();
    orchestrator
        .send_input(&alice(), &hilo, "50", None)
        .await
        .unwrap();

    ctx.registry().remove(&entered.session_id);

    let resumed = orchestrator.enter(&alice(), "Alice", &hilo).await.unwrap();
    assert!(resumed.resumed);

    // the round continues: guesses still count from the saved state
    let guess = orchestrator
        .send_input(&alice(), &hilo, "25", None)
        .await
        .unwrap();
    assert!(!guess.exited);
}

#[tokio::test]
async fn test_users_do_not_share_door_sessions() {
    let ctx = service_context();
    let orchestrator = DoorOrchestrator::new(&ctx);
    let bob = UserId::new("bob");

    orchestrator.enter(&alice(), "Alice", &oracle()).await.unwrap();
    orchestrator
        .send_input(&alice(), &oracle(), "a question", None)
        .await
        .unwrap();

    let entered = orchestrator.enter(&bob, "Bob", &oracle()).await.unwrap();
    assert!(!entered.resumed);

    let info = orchestrator.session_info(&bob, &oracle()).await.unwrap();
    assert_eq!(info.history_len, 0);
}
