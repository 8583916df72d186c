use crate::error::EngineError;
use crate::game::controller::GameController;
use crate::game::events::{GameOutcome, RoundResult};
use crate::game::participant::{Participant, ScriptedParticipant};
use crate::game::state::{GameConfig, GameState};
use crate::model::player::{PlayerId, Seat};
use serde::{Deserialize, Serialize};

/// Enough to rebuild a game from its first deal: the seed drives every shuffle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSnapshot {
    pub seed: u64,
    pub roster: Vec<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_dealer: Option<Seat>,
}

impl GameSnapshot {
    pub fn capture(state: &GameState) -> Self {
        GameSnapshot {
            seed: state.seed(),
            roster: state
                .seating()
                .players()
                .iter()
                .map(|player| player.id.clone())
                .collect(),
            first_dealer: state.config().first_dealer,
        }
    }

    pub fn restore(&self) -> Result<GameState, EngineError> {
        GameState::new(
            self.roster.clone(),
            GameConfig {
                seed: self.seed,
                first_dealer: self.first_dealer,
            },
        )
    }

    pub fn to_json(state: &GameState) -> serde_json::Result<String> {
        let snapshot = Self::capture(state);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// A finished game: how it was set up plus every round transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameRecord {
    pub snapshot: GameSnapshot,
    pub outcome: GameOutcome,
}

impl GameRecord {
    pub fn new(snapshot: GameSnapshot, outcome: GameOutcome) -> Self {
        Self { snapshot, outcome }
    }

    pub fn rounds(&self) -> &[RoundResult] {
        &self.outcome.rounds
    }

    /// Plays the recorded inputs back against a freshly restored game.
    pub fn replay(&self) -> Result<GameOutcome, EngineError> {
        let state = self.snapshot.restore()?;
        let participants = self
            .snapshot
            .roster
            .iter()
            .map(|player| {
                Box::new(ScriptedParticipant::from_transcript(player, self.rounds()))
                    as Box<dyn Participant>
            })
            .collect();
        GameController::new(state, participants)?.run()
    }

    /// True when replaying the record reproduces it exactly.
    pub fn verify(&self) -> Result<bool, EngineError> {
        Ok(self.replay()? == self.outcome)
    }
}
