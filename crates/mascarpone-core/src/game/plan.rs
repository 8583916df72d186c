use crate::error::EngineError;
use crate::model::deck::DECK_SIZE;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Descending,
    Ascending,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Descending => f.write_str("descending"),
            Phase::Ascending => f.write_str("ascending"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlannedRound {
    pub phase: Phase,
    pub cards_per_hand: u8,
}

impl PlannedRound {
    pub const fn new(phase: Phase, cards_per_hand: u8) -> Self {
        Self {
            phase,
            cards_per_hand,
        }
    }

    pub fn fits(&self, active_players: usize) -> bool {
        active_players * usize::from(self.cards_per_hand) <= DECK_SIZE
    }
}

const SCHEDULE: [PlannedRound; 9] = [
    PlannedRound::new(Phase::Descending, 5),
    PlannedRound::new(Phase::Descending, 4),
    PlannedRound::new(Phase::Descending, 3),
    PlannedRound::new(Phase::Descending, 2),
    PlannedRound::new(Phase::Ascending, 3),
    PlannedRound::new(Phase::Ascending, 4),
    PlannedRound::new(Phase::Ascending, 5),
    PlannedRound::new(Phase::Ascending, 6),
    PlannedRound::new(Phase::Ascending, 7),
];

/// Lazy cursor over the candidate rounds. Each request is checked against the number of
/// players still active at that moment; candidates that would overdraw the deck are
/// skipped for good.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoundPlan {
    cursor: usize,
}

impl RoundPlan {
    pub const fn new() -> Self {
        Self { cursor: 0 }
    }

    pub fn schedule() -> &'static [PlannedRound] {
        &SCHEDULE
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> &'static [PlannedRound] {
        &SCHEDULE[self.cursor.min(SCHEDULE.len())..]
    }

    pub fn next_for(&mut self, active_players: usize) -> Option<PlannedRound> {
        while let Some(candidate) = SCHEDULE.get(self.cursor).copied() {
            self.cursor += 1;
            if candidate.fits(active_players) {
                return Some(candidate);
            }
        }
        None
    }

    pub fn require_next(
        &mut self,
        active_players: usize,
        round_index: u32,
    ) -> Result<PlannedRound, EngineError> {
        self.next_for(active_players)
            .ok_or(EngineError::PlanExhausted {
                round_index,
                active_players,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{Phase, PlannedRound, RoundPlan};
    use crate::error::EngineError;

    #[test]
    fn two_players_get_the_full_schedule() {
        let mut plan = RoundPlan::new();
        let sizes: Vec<u8> = std::iter::from_fn(|| plan.next_for(2))
            .map(|round| round.cards_per_hand)
            .collect();
        assert_eq!(sizes, vec![5, 4, 3, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn phases_switch_after_the_two_card_round() {
        let mut plan = RoundPlan::new();
        for _ in 0..4 {
            assert_eq!(plan.next_for(3).unwrap().phase, Phase::Descending);
        }
        assert_eq!(
            plan.next_for(3),
            Some(PlannedRound::new(Phase::Ascending, 3))
        );
    }

    #[test]
    fn ten_players_skip_rounds_that_overdraw_the_deck() {
        let mut plan = RoundPlan::new();
        let sizes: Vec<u8> = std::iter::from_fn(|| plan.next_for(10))
            .map(|round| round.cards_per_hand)
            .collect();
        assert_eq!(sizes, vec![5, 4, 3, 2, 3, 4, 5]);
    }

    #[test]
    fn fit_is_evaluated_against_the_current_count() {
        let mut plan = RoundPlan::new();
        for _ in 0..7 {
            plan.next_for(10).unwrap();
        }
        // Six-card round fits once the table shrinks to eight.
        assert_eq!(
            plan.next_for(8),
            Some(PlannedRound::new(Phase::Ascending, 6))
        );
    }

    #[test]
    fn exhaustion_is_reported_with_context() {
        let mut plan = RoundPlan::new();
        while plan.next_for(2).is_some() {}
        assert_eq!(
            plan.require_next(2, 10),
            Err(EngineError::PlanExhausted {
                round_index: 10,
                active_players: 2
            })
        );
        assert!(plan.remaining().is_empty());
    }
}
