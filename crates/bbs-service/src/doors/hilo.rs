//! Hi-Lo door
//!
//! Number guessing between 1 and 100. The secret, guess count, and win
//! tally live in the session's door-state blob, so a dropped session
//! resumes mid-round with the same secret.

use async_trait::async_trait;
use bbs_core::{Door, DoorId, DoorResult, Session, DATA_DOOR_STATE};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HiLoState {
    target: u32,
    guesses: u32,
    wins: u32,
}

impl HiLoState {
    fn new_round(wins: u32) -> Self {
        Self {
            target: rand::thread_rng().gen_range(1..=100),
            guesses: 0,
            wins,
        }
    }
}

pub struct HiLoDoor {
    id: DoorId,
}

impl HiLoDoor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: DoorId::new("hilo"),
        }
    }

    fn load_state(session: &Session) -> Option<HiLoState> {
        session
            .data
            .get(DATA_DOOR_STATE)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    fn save_state(session: &mut Session, state: &HiLoState) {
        if let Ok(value) = serde_json::to_value(state) {
            session.data.insert(DATA_DOOR_STATE.to_string(), value);
        }
    }
}

impl Default for HiLoDoor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Door for HiLoDoor {
    fn id(&self) -> DoorId {
        self.id.clone()
    }

    fn name(&self) -> &str {
        "Hi-Lo"
    }

    async fn enter(&self, session: &mut Session) -> DoorResult {
        match Self::load_state(session) {
            Some(state) => {
                let text = format!(
                    "Welcome back to Hi-Lo. A round is in progress ({} guess(es) so far).\n\
                     Guess a number between 1 and 100, or type 'quit' to leave.",
                    state.guesses
                );
                Self::save_state(session, &state);
                Ok(text)
            }
            None => {
                let state = HiLoState::new_round(0);
                Self::save_state(session, &state);
                Ok("Welcome to Hi-Lo! I'm thinking of a number between 1 and 100.\n\
                    Guess it, or type 'quit' to leave."
                    .to_string())
            }
        }
    }

    async fn handle_input(&self, input: &str, session: &mut Session) -> DoorResult {
        let trimmed = input.trim();

        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            session.leave_door();
            return Ok("Leaving Hi-Lo. The secret stays secret.".to_string());
        }

        let mut state = Self::load_state(session).unwrap_or_else(|| HiLoState::new_round(0));

        let Ok(guess) = trimmed.parse::<u32>() else {
            return Ok("That's not a number. Guess between 1 and 100, or 'quit'.".to_string());
        };

        if !(1..=100).contains(&guess) {
            return Ok("Out of range. The number is between 1 and 100.".to_string());
        }

        state.guesses += 1;

        let response = match guess.cmp(&state.target) {
            std::cmp::Ordering::Less => {
                let text = format!("{guess} is too low. Guess #{}.", state.guesses);
                Self::save_state(session, &state);
                text
            }
            std::cmp::Ordering::Greater => {
                let text = format!("{guess} is too high. Guess #{}.", state.guesses);
                Self::save_state(session, &state);
                text
            }
            std::cmp::Ordering::Equal => {
                let text = format!(
                    "Correct! {guess} in {} guess(es). Total wins: {}. New round started.",
                    state.guesses,
                    state.wins + 1
                );
                let next = HiLoState::new_round(state.wins + 1);
                Self::save_state(session, &next);
                text
            }
        };

        Ok(response)
    }

    async fn exit(&self, session: &mut Session) -> DoorResult {
        let wins = Self::load_state(session).map_or(0, |s| s.wins);
        Ok(format!("Thanks for playing Hi-Lo. Wins this visit: {wins}."))
    }
}
