//! Oracle door
//!
//! A fortune-teller: each line of input is a question and draws a random
//! pronouncement. The only state worth keeping is how many questions have
//! been asked, so resumption greets a returning seeker by count.

use async_trait::async_trait;
use bbs_core::{Door, DoorId, DoorResult, Session, DATA_DOOR_STATE};
use rand::Rng;
use serde_json::json;

const PRONOUNCEMENTS: &[&str] = &[
    "The signs point to yes.",
    "Ask again when the moon is full.",
    "What you seek is closer than you think.",
    "The outcome is clouded. Tread carefully.",
    "It is certain, though not in the way you expect.",
    "The stars say no, but stars have been wrong before.",
    "An unexpected visitor will change everything.",
    "Patience. The answer ripens on its own schedule.",
];

pub struct OracleDoor {
    id: DoorId,
}

impl OracleDoor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: DoorId::new("oracle"),
        }
    }

    fn consultations(session: &Session) -> u64 {
        session
            .data
            .get(DATA_DOOR_STATE)
            .and_then(|v| v.get("consultations"))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0)
    }

    fn save_consultations(session: &mut Session, count: u64) {
        session.data.insert(
            DATA_DOOR_STATE.to_string(),
            json!({ "consultations": count }),
        );
    }
}

impl Default for OracleDoor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Door for OracleDoor {
    fn id(&self) -> DoorId {
        self.id.clone()
    }

    fn name(&self) -> &str {
        "The Oracle"
    }

    async fn enter(&self, session: &mut Session) -> DoorResult {
        let asked = Self::consultations(session);
        Self::save_consultations(session, asked);

        if asked > 0 {
            Ok(format!(
                "The Oracle regards you knowingly. You have asked {asked} question(s) before.\n\
                 Speak your question, or type 'quit' to leave."
            ))
        } else {
            Ok("You step into a dim chamber thick with incense.\n\
                The Oracle awaits your question. Type 'quit' to leave."
                .to_string())
        }
    }

    async fn handle_input(&self, input: &str, session: &mut Session) -> DoorResult {
        let trimmed = input.trim();

        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            session.leave_door();
            return Ok("The Oracle bows as the incense thins.".to_string());
        }

        if trimmed.is_empty() {
            return Ok("The Oracle waits. A question must be spoken aloud.".to_string());
        }

        let asked = Self::consultations(session) + 1;
        Self::save_consultations(session, asked);

        let pick = rand::thread_rng().gen_range(0..PRONOUNCEMENTS.len());
        Ok(format!(
            "The Oracle closes its eyes... \"{}\"",
            PRONOUNCEMENTS[pick]
        ))
    }

    async fn exit(&self, session: &mut Session) -> DoorResult {
        let asked = Self::consultations(session);
        Ok(format!(
            "You leave the chamber. The Oracle answered {asked} question(s)."
        ))
    }
}
