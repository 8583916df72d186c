use crate::game::plan::Phase;
use crate::model::card::{Card, Extreme};
use crate::model::player::{PlayerId, Seat};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerOutcome {
    pub player: PlayerId,
    pub seat: Seat,
    pub declared: u8,
    pub won: u8,
    pub eliminated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationRecord {
    pub player: PlayerId,
    pub seat: Seat,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub player: PlayerId,
    pub seat: Seat,
    pub card: Card,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extreme: Option<Extreme>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrickRecord {
    pub plays: Vec<PlayRecord>,
    pub winner: PlayerId,
}

/// Emitted once per round after eliminations are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_index: u32,
    pub phase: Phase,
    pub cards_per_hand: u8,
    pub dealer: PlayerId,
    pub players: Vec<PlayerOutcome>,
    pub declarations: Vec<DeclarationRecord>,
    pub tricks: Vec<TrickRecord>,
}

impl RoundResult {
    pub fn eliminated(&self) -> impl Iterator<Item = &PlayerId> {
        self.players
            .iter()
            .filter(|outcome| outcome.eliminated)
            .map(|outcome| &outcome.player)
    }

    pub fn survivors(&self) -> impl Iterator<Item = &PlayerId> {
        self.players
            .iter()
            .filter(|outcome| !outcome.eliminated)
            .map(|outcome| &outcome.player)
    }

    pub fn declared_total(&self) -> u32 {
        self.declarations.iter().map(|d| u32::from(d.value)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    LastSurvivor,
    AllEliminated,
    PlanExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: Option<PlayerId>,
    pub reason: TerminationReason,
    pub rounds_played: u32,
    /// Players still seated when the game stopped.
    pub remaining: Vec<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub rounds: Vec<RoundResult>,
    pub result: GameResult,
}
