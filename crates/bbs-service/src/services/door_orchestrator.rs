//! Door orchestrator
//!
//! Mediates between live sessions, the door registry, and the durable
//! game-session store. Callers never talk to a door directly: every
//! enter/input/exit goes through here, which is where resumption,
//! write-through persistence, and exclusivity are enforced.
//!
//! Door failures never escape to the caller as errors. A door that returns
//! an error on input is converted into a safe fallback response plus a
//! forced return to the menu, with its saved record left intact for a later
//! resume attempt.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use bbs_core::{
    ConnectionId, Door, DoorId, GameSessionRecord, InteractionEntry, Session, SessionId,
    SessionState, UserId, DATA_DOOR_HISTORY, DATA_DOOR_STATE,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Shown when a door fails and the session is dropped back to the menu
const DOOR_FAULT_TEXT: &str = "The door stopped responding. You are back at the main menu.";

/// Prefix announcing a restored saved session
const RESUME_NOTICE: &str = "[Resuming your previous session]";

/// Result of entering a door
#[derive(Debug, Clone, Serialize)]
pub struct EnterOutcome {
    pub session_id: SessionId,
    pub output: String,
    pub resumed: bool,
}

/// Result of one line of door input
#[derive(Debug, Clone, Serialize)]
pub struct InputOutcome {
    pub output: String,
    pub exited: bool,
}

/// Result of an explicit door exit
#[derive(Debug, Clone, Serialize)]
pub struct ExitOutcome {
    pub output: String,
}

/// Snapshot of a user's standing with one door
#[derive(Debug, Clone, Serialize)]
pub struct DoorSessionInfo {
    pub in_door: bool,
    pub has_saved_session: bool,
    pub last_activity: Option<DateTime<Utc>>,
    pub history_len: usize,
}

/// Door orchestration service
pub struct DoorOrchestrator<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DoorOrchestrator<'a> {
    /// Create a new DoorOrchestrator
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Enter a door, resuming the saved record if one exists
    ///
    /// At most one live session per (user, door) pair: a second enter while
    /// the first is live resumes it rather than forking a parallel run.
    #[instrument(skip(self, handle))]
    pub async fn enter(
        &self,
        user_id: &UserId,
        handle: &str,
        door_id: &DoorId,
    ) -> ServiceResult<EnterOutcome> {
        let door = self.lookup_door(door_id)?;
        let lock = self.ctx.door_lock(user_id, door_id);
        let _guard = lock.lock().await;

        let mut session = self.resolve_or_create_session(user_id, handle, door_id);

        let record = self.ctx.game_sessions().get_active(user_id, door_id).await?;
        let resumed = record.is_some();

        if let Some(rec) = &record {
            restore_into_session(&mut session, rec)?;
        }
        session.enter_door(door_id);

        let opening = match door.enter(&mut session).await {
            Ok(text) => text,
            Err(e) => {
                warn!(door_id = %door_id, error = %e, "Door enter failed");
                session.leave_door();
                session.touch();
                let session_id = session.id.clone();
                self.ctx.registry().replace(session);
                return Ok(EnterOutcome {
                    session_id,
                    output: DOOR_FAULT_TEXT.to_string(),
                    resumed: false,
                });
            }
        };

        if record.is_none() {
            let mut fresh = GameSessionRecord::new(user_id.clone(), door_id.clone());
            fresh.state = door_state_of(&session);
            self.ctx.game_sessions().create(&fresh).await?;
        }

        session.touch();
        let session_id = session.id.clone();
        self.ctx.registry().replace(session);

        info!(user_id = %user_id, door_id = %door_id, resumed, "Door entered");

        let output = if resumed {
            format!("{RESUME_NOTICE}\n{opening}")
        } else {
            opening
        };

        Ok(EnterOutcome {
            session_id,
            output,
            resumed,
        })
    }

    /// Feed one line of input to the door the user is inside
    ///
    /// Every accepted input is checkpointed to the durable store before the
    /// response is returned.
    #[instrument(skip(self, input))]
    pub async fn send_input(
        &self,
        user_id: &UserId,
        door_id: &DoorId,
        input: &str,
        session_id: Option<&SessionId>,
    ) -> ServiceResult<InputOutcome> {
        let door = self.lookup_door(door_id)?;

        let limiter_key = format!("input:{user_id}");
        if !self.ctx.door_input_limiter().check(&limiter_key) {
            return Err(bbs_core::DomainError::RateLimitExceeded {
                key: limiter_key.clone(),
                retry_in_secs: self.ctx.door_input_limiter().reset_in_seconds(&limiter_key),
            }
            .into());
        }

        let lock = self.ctx.door_lock(user_id, door_id);
        let guard = lock.lock().await;

        let mut session = self.require_session(user_id, door_id, session_id)?;
        self.verify_in_door(&session, user_id, door_id)?;

        let outcome = match door.handle_input(input, &mut session).await {
            Ok(text) => {
                session.touch();
                let exited = session.state != SessionState::InDoor;

                if exited {
                    // the door signaled completion; run the exit path so the
                    // record is reclaimed and the farewell delivered
                    let farewell = self.finish_exit(&door, &mut session, user_id, door_id).await;
                    self.ctx.registry().replace(session);
                    InputOutcome {
                        output: format!("{text}\n{farewell}"),
                        exited: true,
                    }
                } else {
                    self.checkpoint(&session, user_id, door_id, input, &text)
                        .await?;
                    self.ctx.registry().replace(session);
                    InputOutcome {
                        output: text,
                        exited: false,
                    }
                }
            }
            Err(e) => {
                warn!(door_id = %door_id, error = %e, "Door input failed, forcing exit");
                session.leave_door();
                clear_door_data(&mut session);
                session.touch();
                self.ctx.registry().replace(session);
                InputOutcome {
                    output: DOOR_FAULT_TEXT.to_string(),
                    exited: true,
                }
            }
        };

        if outcome.exited {
            drop(guard);
            self.ctx.reclaim_door_lock(user_id, door_id);
        }

        Ok(outcome)
    }

    /// Leave a door explicitly, reclaiming the saved record
    #[instrument(skip(self))]
    pub async fn exit(
        &self,
        user_id: &UserId,
        door_id: &DoorId,
        session_id: Option<&SessionId>,
    ) -> ServiceResult<ExitOutcome> {
        let door = self.lookup_door(door_id)?;
        let lock = self.ctx.door_lock(user_id, door_id);
        let guard = lock.lock().await;

        let session = match session_id {
            Some(id) => self.ctx.registry().get(id),
            None => self.find_session(user_id, door_id),
        };

        let output = match session {
            Some(mut session) => {
                if !session.belongs_to(user_id) {
                    return Err(bbs_core::DomainError::SessionOwnershipMismatch {
                        session_id: session.id.clone(),
                        user_id: user_id.clone(),
                    }
                    .into());
                }

                let farewell = if session.is_in_door(door_id) {
                    self.finish_exit(&door, &mut session, user_id, door_id).await
                } else {
                    self.delete_record(user_id, door_id).await;
                    "You are not in that door.".to_string()
                };
                self.ctx.registry().replace(session);
                farewell
            }
            None => {
                // no live session; still reclaim any orphaned record
                self.delete_record(user_id, door_id).await;
                "You have left the door.".to_string()
            }
        };

        info!(user_id = %user_id, door_id = %door_id, "Door exited");

        drop(guard);
        self.ctx.reclaim_door_lock(user_id, door_id);

        Ok(ExitOutcome { output })
    }

    /// Report whether the user is inside the door and what is saved for it
    #[instrument(skip(self))]
    pub async fn session_info(
        &self,
        user_id: &UserId,
        door_id: &DoorId,
    ) -> ServiceResult<DoorSessionInfo> {
        self.lookup_door(door_id)?;

        let live = self.find_session(user_id, door_id);
        let record = self.ctx.game_sessions().get_active(user_id, door_id).await?;

        let last_activity = live
            .as_ref()
            .map(|s| s.last_activity)
            .or_else(|| record.as_ref().map(|r| r.updated_at));

        Ok(DoorSessionInfo {
            in_door: live.is_some(),
            has_saved_session: record.is_some(),
            last_activity,
            history_len: record.map_or(0, |r| r.history.len()),
        })
    }

    // === internals ===

    fn lookup_door(&self, door_id: &DoorId) -> ServiceResult<Arc<dyn Door>> {
        self.ctx
            .doors()
            .get(door_id)
            .ok_or_else(|| bbs_core::DomainError::DoorNotFound(door_id.clone()).into())
    }

    /// Live session a user holds for this door, via the in-door scan or the
    /// deterministic stateless bridge connection
    fn find_session(&self, user_id: &UserId, door_id: &DoorId) -> Option<Session> {
        self.ctx
            .registry()
            .find_door_session(user_id, door_id)
            .or_else(|| {
                self.ctx
                    .registry()
                    .get_by_connection(&ConnectionId::stateless(user_id, door_id))
            })
            .filter(|s| s.belongs_to(user_id))
    }

    fn resolve_or_create_session(
        &self,
        user_id: &UserId,
        handle: &str,
        door_id: &DoorId,
    ) -> Session {
        if let Some(session) = self.find_session(user_id, door_id) {
            return session;
        }

        let conn = ConnectionId::stateless(user_id, door_id);
        let mut session = self.ctx.registry().create(Some(conn));
        session.user_id = Some(user_id.clone());
        session.handle = Some(handle.to_string());
        session.state = SessionState::InMenu;
        session
    }

    fn require_session(
        &self,
        user_id: &UserId,
        door_id: &DoorId,
        session_id: Option<&SessionId>,
    ) -> ServiceResult<Session> {
        if let Some(id) = session_id {
            let session = self
                .ctx
                .registry()
                .get(id)
                .ok_or_else(|| bbs_core::DomainError::SessionNotFound(id.clone()))?;
            return Ok(session);
        }

        self.find_session(user_id, door_id).ok_or_else(|| {
            bbs_core::DomainError::SessionNotFound(SessionId::new(format!("{user_id}:{door_id}")))
                .into()
        })
    }

    fn verify_in_door(
        &self,
        session: &Session,
        user_id: &UserId,
        door_id: &DoorId,
    ) -> ServiceResult<()> {
        if !session.belongs_to(user_id) {
            return Err(bbs_core::DomainError::SessionOwnershipMismatch {
                session_id: session.id.clone(),
                user_id: user_id.clone(),
            }
            .into());
        }
        if !session.is_in_door(door_id) {
            return Err(bbs_core::DomainError::InvalidSessionState {
                expected: "IN_DOOR",
                actual: format!("{:?}", session.state),
            }
            .into());
        }
        Ok(())
    }

    /// Write-through checkpoint after one accepted input
    async fn checkpoint(
        &self,
        session: &Session,
        user_id: &UserId,
        door_id: &DoorId,
        input: &str,
        output: &str,
    ) -> ServiceResult<()> {
        let state = door_state_of(session);

        match self.ctx.game_sessions().get_active(user_id, door_id).await? {
            Some(mut record) => {
                record.history.push(InteractionEntry::new(input, output));
                self.ctx
                    .game_sessions()
                    .update(&record.id, &state, &record.history)
                    .await?;
            }
            None => {
                // record vanished underneath us (e.g. reclaimed); recreate
                let mut record = GameSessionRecord::new(user_id.clone(), door_id.clone());
                record.state = state;
                record.history.push(InteractionEntry::new(input, output));
                self.ctx.game_sessions().create(&record).await?;
            }
        }

        Ok(())
    }

    /// Shared teardown: defensive door exit, record reclaim, menu state
    async fn finish_exit(
        &self,
        door: &Arc<dyn Door>,
        session: &mut Session,
        user_id: &UserId,
        door_id: &DoorId,
    ) -> String {
        let farewell = match door.exit(session).await {
            Ok(text) => text,
            Err(e) => {
                warn!(door_id = %door_id, error = %e, "Door exit failed");
                "You have left the door.".to_string()
            }
        };

        self.delete_record(user_id, door_id).await;

        if session.state == SessionState::InDoor {
            session.leave_door();
        }
        clear_door_data(session);
        session.touch();

        farewell
    }

    /// Reclaim the active record, swallowing store failures
    ///
    /// Exit must always return the user to the menu; a failed delete is
    /// logged and the record becomes an orphan the next enter resumes.
    async fn delete_record(&self, user_id: &UserId, door_id: &DoorId) {
        match self.ctx.game_sessions().get_active(user_id, door_id).await {
            Ok(Some(record)) => {
                if let Err(e) = self.ctx.game_sessions().delete(&record.id).await {
                    warn!(record_id = %record.id, error = %e, "Failed to delete door record");
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(user_id = %user_id, door_id = %door_id, error = %e, "Record lookup failed during exit");
            }
        }
    }
}

/// Door-state blob currently held in the session's data bag
fn door_state_of(session: &Session) -> Value {
    session
        .data
        .get(DATA_DOOR_STATE)
        .cloned()
        .unwrap_or(Value::Null)
}

/// Load a saved record's blob and history into the session's data bag
fn restore_into_session(session: &mut Session, record: &GameSessionRecord) -> ServiceResult<()> {
    if !record.state.is_null() {
        session
            .data
            .insert(DATA_DOOR_STATE.to_string(), record.state.clone());
    }
    let history = serde_json::to_value(&record.history)
        .map_err(|e| ServiceError::internal(format!("History serialization failed: {e}")))?;
    session.data.insert(DATA_DOOR_HISTORY.to_string(), history);
    Ok(())
}

fn clear_door_data(session: &mut Session) {
    session.data.remove(DATA_DOOR_STATE);
    session.data.remove(DATA_DOOR_HISTORY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doors::DoorRegistry;
    use crate::registry::SessionRegistry;
    use async_trait::async_trait;
    use bbs_common::{RateLimitConfig, RateLimitRule, SessionConfig};
    use bbs_db::MemoryGameSessionRepository;

    /// Echo door used to drive the orchestrator deterministically
    struct EchoDoor;

    #[async_trait]
    impl Door for EchoDoor {
        fn id(&self) -> DoorId {
            DoorId::new("echo")
        }

        fn name(&self) -> &str {
            "Echo"
        }

        async fn enter(&self, _session: &mut Session) -> bbs_core::DoorResult {
            Ok("Echo chamber. Say something.".to_string())
        }

        async fn handle_input(&self, input: &str, session: &mut Session) -> bbs_core::DoorResult {
            if input == "quit" {
                session.leave_door();
                return Ok("Silence falls.".to_string());
            }
            session.data.insert(
                DATA_DOOR_STATE.to_string(),
                serde_json::json!({ "last": input }),
            );
            Ok(format!("{input}... {input}..."))
        }

        async fn exit(&self, _session: &mut Session) -> bbs_core::DoorResult {
            Ok("The echoes fade.".to_string())
        }
    }

    /// Door whose input handler always fails
    struct FaultyDoor;

    #[async_trait]
    impl Door for FaultyDoor {
        fn id(&self) -> DoorId {
            DoorId::new("faulty")
        }

        fn name(&self) -> &str {
            "Faulty"
        }

        async fn enter(&self, _session: &mut Session) -> bbs_core::DoorResult {
            Ok("Enter at your own risk.".to_string())
        }

        async fn handle_input(&self, _input: &str, _session: &mut Session) -> bbs_core::DoorResult {
            anyhow::bail!("internal door crash")
        }

        async fn exit(&self, _session: &mut Session) -> bbs_core::DoorResult {
            anyhow::bail!("exit also crashes")
        }
    }

    fn test_context() -> ServiceContext {
        test_context_with_limit(RateLimitRule {
            max: 100,
            window_secs: 60,
        })
    }

    fn test_context_with_limit(door_input: RateLimitRule) -> ServiceContext {
        let doors = DoorRegistry::new();
        doors.register(Arc::new(EchoDoor));
        doors.register(Arc::new(FaultyDoor));

        ServiceContext::new(
            SessionRegistry::new_shared(&SessionConfig {
                timeout_secs: 1800,
                sweep_interval_secs: 60,
            }),
            Arc::new(MemoryGameSessionRepository::new()),
            Arc::new(doors),
            &RateLimitConfig {
                message_post: RateLimitRule {
                    max: 100,
                    window_secs: 60,
                },
                door_input,
                subscription_change: RateLimitRule {
                    max: 100,
                    window_secs: 60,
                },
                http_requests_per_second: 50,
                http_burst: 100,
            },
        )
    }

    fn alice() -> UserId {
        UserId::new("alice")
    }

    fn echo() -> DoorId {
        DoorId::new("echo")
    }

    #[tokio::test]
    async fn test_enter_creates_record_and_session() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        let outcome = orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();

        assert!(!outcome.resumed);
        assert!(outcome.output.contains("Echo chamber"));

        let session = ctx.registry().get(&outcome.session_id).unwrap();
        assert!(session.is_in_door(&echo()));

        let record = ctx
            .game_sessions()
            .get_active(&alice(), &echo())
            .await
            .unwrap();
        assert!(record.is_some());
    }

    #[tokio::test]
    async fn test_unknown_door_is_not_found() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        let err = orchestrator
            .enter(&alice(), "Alice", &DoorId::new("tradewars"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "DOOR_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_second_enter_resumes() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        let first = orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();
        assert!(!first.resumed);

        let second = orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();
        assert!(second.resumed);
        assert!(second.output.starts_with(RESUME_NOTICE));
        // same live session, not a parallel run
        assert_eq!(second.session_id, first.session_id);
    }

    #[tokio::test]
    async fn test_input_checkpoints_state_and_history() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();
        let outcome = orchestrator
            .send_input(&alice(), &echo(), "hello", None)
            .await
            .unwrap();

        assert!(!outcome.exited);
        assert!(outcome.output.contains("hello"));

        let record = ctx
            .game_sessions()
            .get_active(&alice(), &echo())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.history[0].input, "hello");
        assert_eq!(record.state, serde_json::json!({ "last": "hello" }));
    }

    #[tokio::test]
    async fn test_resume_restores_door_state() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        let first = orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();
        orchestrator
            .send_input(&alice(), &echo(), "remember me", None)
            .await
            .unwrap();

        // simulate a disconnect without exit
        ctx.registry().remove(&first.session_id);

        let second = orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();
        assert!(second.resumed);

        let session = ctx.registry().get(&second.session_id).unwrap();
        assert_eq!(
            session.data.get(DATA_DOOR_STATE),
            Some(&serde_json::json!({ "last": "remember me" }))
        );
    }

    #[tokio::test]
    async fn test_door_signaled_exit_reclaims_record() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();
        let outcome = orchestrator
            .send_input(&alice(), &echo(), "quit", None)
            .await
            .unwrap();

        assert!(outcome.exited);
        assert!(outcome.output.contains("The echoes fade"));

        assert!(ctx
            .game_sessions()
            .get_active(&alice(), &echo())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_explicit_exit_deletes_record_and_returns_to_menu() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        let entered = orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();
        let outcome = orchestrator.exit(&alice(), &echo(), None).await.unwrap();

        assert!(outcome.output.contains("The echoes fade"));

        let session = ctx.registry().get(&entered.session_id).unwrap();
        assert_eq!(session.state, SessionState::InMenu);

        assert!(ctx
            .game_sessions()
            .get_active(&alice(), &echo())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_explicit_exit_reclaims_entry_lock() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();
        assert_eq!(ctx.tracked_door_locks(), 1);

        orchestrator.exit(&alice(), &echo(), None).await.unwrap();
        assert_eq!(ctx.tracked_door_locks(), 0);
    }

    #[tokio::test]
    async fn test_door_signaled_exit_reclaims_entry_lock() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();
        let outcome = orchestrator
            .send_input(&alice(), &echo(), "quit", None)
            .await
            .unwrap();
        assert!(outcome.exited);
        assert_eq!(ctx.tracked_door_locks(), 0);
    }

    #[tokio::test]
    async fn test_input_without_session_is_not_found() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        let err = orchestrator
            .send_input(&alice(), &echo(), "hello", None)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_input_against_foreign_session_is_rejected() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        let entered = orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();

        let err = orchestrator
            .send_input(&UserId::new("bob"), &echo(), "hello", Some(&entered.session_id))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "SESSION_OWNERSHIP_MISMATCH");
    }

    #[tokio::test]
    async fn test_faulty_door_forces_exit_without_losing_record() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);
        let faulty = DoorId::new("faulty");

        let entered = orchestrator.enter(&alice(), "Alice", &faulty).await.unwrap();
        let outcome = orchestrator
            .send_input(&alice(), &faulty, "boom", None)
            .await
            .unwrap();

        assert!(outcome.exited);
        assert_eq!(outcome.output, DOOR_FAULT_TEXT);

        // back at the menu, record kept for a later resume
        let session = ctx.registry().get(&entered.session_id).unwrap();
        assert_eq!(session.state, SessionState::InMenu);
        assert!(ctx
            .game_sessions()
            .get_active(&alice(), &faulty)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_input_rate_limit() {
        let ctx = test_context_with_limit(RateLimitRule {
            max: 2,
            window_secs: 60,
        });
        let orchestrator = DoorOrchestrator::new(&ctx);

        orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();
        orchestrator
            .send_input(&alice(), &echo(), "one", None)
            .await
            .unwrap();
        orchestrator
            .send_input(&alice(), &echo(), "two", None)
            .await
            .unwrap();

        let err = orchestrator
            .send_input(&alice(), &echo(), "three", None)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "RATE_LIMIT_EXCEEDED");
        assert!(err.retry_in_secs().is_some());
    }

    #[tokio::test]
    async fn test_session_info_reflects_saved_progress() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        let before = orchestrator.session_info(&alice(), &echo()).await.unwrap();
        assert!(!before.in_door);
        assert!(!before.has_saved_session);
        assert_eq!(before.history_len, 0);

        let entered = orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();
        orchestrator
            .send_input(&alice(), &echo(), "hello", None)
            .await
            .unwrap();

        // disconnect without exit
        ctx.registry().remove(&entered.session_id);

        let after = orchestrator.session_info(&alice(), &echo()).await.unwrap();
        assert!(!after.in_door);
        assert!(after.has_saved_session);
        assert_eq!(after.history_len, 1);
        assert!(after.last_activity.is_some());
    }

    #[tokio::test]
    async fn test_exit_without_session_reclaims_orphan_record() {
        let ctx = test_context();
        let orchestrator = DoorOrchestrator::new(&ctx);

        let entered = orchestrator.enter(&alice(), "Alice", &echo()).await.unwrap();
        ctx.registry().remove(&entered.session_id);

        let outcome = orchestrator.exit(&alice(), &echo(), None).await.unwrap();
        assert!(outcome.output.contains("left the door"));

        assert!(ctx
            .game_sessions()
            .get_active(&alice(), &echo())
            .await
            .unwrap()
            .is_none());
    }
}
