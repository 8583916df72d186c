use crate::error::{EngineError, PlayRejection};
use crate::game::plan::{Phase, PlannedRound};
use crate::model::card::{Card, Extreme, PlayedCard};
use crate::model::declaration::Declarations;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::player::Seat;
use crate::model::trick::Trick;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStage {
    Declaring,
    Playing,
    Scoring,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    TrickCompleted { winner: Seat },
    RoundCompleted { winner: Seat },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatScore {
    pub seat: Seat,
    pub declared: u8,
    pub won: u8,
    pub eliminated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTrick {
    pub trick: Trick,
    pub winner: Seat,
}

/// One round from the deal to the elimination verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    index: u32,
    planned: PlannedRound,
    dealer: Seat,
    rotation: Vec<Seat>,
    hands: BTreeMap<Seat, Hand>,
    declarations: Declarations,
    current_trick: Trick,
    trick_history: Vec<CompletedTrick>,
    tricks_won: BTreeMap<Seat, u8>,
    stage: RoundStage,
}

impl RoundState {
    /// `rotation` lists the active seats clockwise from the seat after the dealer and must
    /// end with the dealer.
    pub fn deal(
        index: u32,
        planned: PlannedRound,
        rotation: Vec<Seat>,
        deck: &Deck,
    ) -> Result<Self, EngineError> {
        let mut seats = rotation.clone();
        seats.sort();
        let dealt = deck
            .deal(seats.len(), planned.cards_per_hand)
            .map_err(|source| EngineError::DealUnderflow {
                round_index: index,
                source,
            })?;
        Self::from_hands(index, planned, rotation, seats.into_iter().zip(dealt))
    }

    pub fn from_hands(
        index: u32,
        planned: PlannedRound,
        rotation: Vec<Seat>,
        hands: impl IntoIterator<Item = (Seat, Hand)>,
    ) -> Result<Self, EngineError> {
        if planned.cards_per_hand == 0 {
            return Err(EngineError::ZeroCardRound);
        }
        let dealer = *rotation.last().ok_or_else(|| EngineError::InvalidRoster {
            count: 0,
            reason: "a round needs at least one active seat".to_string(),
        })?;

        let hands: BTreeMap<Seat, Hand> = hands.into_iter().collect();
        if let Some((&seat, hand)) = hands.iter().find(|(seat, _)| !rotation.contains(*seat)) {
            return Err(EngineError::InvalidHand {
                seat,
                expected: 0,
                found: hand.len(),
            });
        }
        let mut seen = HashSet::new();
        if let Some(&card) = hands
            .values()
            .flat_map(Hand::iter)
            .find(|&&card| !seen.insert(card))
        {
            return Err(EngineError::DuplicateCard(card));
        }
        for seat in &rotation {
            let found = hands.get(seat).map_or(0, Hand::len);
            if found != usize::from(planned.cards_per_hand) {
                return Err(EngineError::InvalidHand {
                    seat: *seat,
                    expected: planned.cards_per_hand,
                    found,
                });
            }
        }

        let tricks_won = rotation.iter().map(|&seat| (seat, 0)).collect();
        Ok(Self {
            index,
            planned,
            dealer,
            declarations: Declarations::new(planned.cards_per_hand, rotation.clone()),
            current_trick: Trick::new(rotation.clone()),
            rotation,
            hands,
            trick_history: Vec::new(),
            tricks_won,
            stage: RoundStage::Declaring,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn phase(&self) -> Phase {
        self.planned.phase
    }

    pub fn cards_per_hand(&self) -> u8 {
        self.planned.cards_per_hand
    }

    pub fn planned(&self) -> PlannedRound {
        self.planned
    }

    pub fn dealer(&self) -> Seat {
        self.dealer
    }

    pub fn stage(&self) -> RoundStage {
        self.stage
    }

    pub fn rotation(&self) -> &[Seat] {
        &self.rotation
    }

    pub fn hand(&self, seat: Seat) -> Option<&Hand> {
        self.hands.get(&seat)
    }

    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current_trick
    }

    pub fn trick_history(&self) -> &[CompletedTrick] {
        &self.trick_history
    }

    pub fn tricks_completed(&self) -> usize {
        self.trick_history.len()
    }

    pub fn tricks_won(&self, seat: Seat) -> u8 {
        self.tricks_won.get(&seat).copied().unwrap_or(0)
    }

    pub fn declaring_seat(&self) -> Option<Seat> {
        match self.stage {
            RoundStage::Declaring => self.declarations.expected_seat(),
            _ => None,
        }
    }

    pub fn current_player(&self) -> Option<Seat> {
        match self.stage {
            RoundStage::Playing => self.current_trick.expected_seat(),
            _ => None,
        }
    }

    pub fn declare(&mut self, seat: Seat, value: u8) -> Result<(), EngineError> {
        self.declarations.submit(seat, value)?;
        if self.declarations.is_complete() {
            self.stage = RoundStage::Playing;
        }
        Ok(())
    }

    pub fn play_card(
        &mut self,
        seat: Seat,
        card: Card,
        extreme: Option<Extreme>,
    ) -> Result<PlayOutcome, EngineError> {
        let reject = |reason| EngineError::IllegalPlay { seat, reason };

        if self.stage != RoundStage::Playing {
            return Err(reject(PlayRejection::NotPlaying));
        }
        if let Some(expected) = self.current_trick.expected_seat() {
            if expected != seat {
                return Err(reject(PlayRejection::OutOfTurn { expected }));
            }
        }
        let hand = self
            .hands
            .get_mut(&seat)
            .ok_or(reject(PlayRejection::NotInHand(card)))?;
        if !hand.contains(card) {
            return Err(reject(PlayRejection::NotInHand(card)));
        }
        let played = PlayedCard::new(card, extreme).map_err(reject)?;

        self.current_trick.play(seat, played)?;
        hand.remove(card);

        let Some(winner) = self.current_trick.winner() else {
            return Ok(PlayOutcome::Played);
        };

        *self.tricks_won.entry(winner).or_insert(0) += 1;
        let next_order = rotate_to(&self.rotation, winner);
        let finished = std::mem::replace(&mut self.current_trick, Trick::new(next_order));
        self.trick_history.push(CompletedTrick {
            trick: finished,
            winner,
        });

        if self.trick_history.len() == usize::from(self.planned.cards_per_hand) {
            self.stage = RoundStage::Scoring;
            Ok(PlayOutcome::RoundCompleted { winner })
        } else {
            Ok(PlayOutcome::TrickCompleted { winner })
        }
    }

    /// Compares each declaration with the tricks taken and closes the round.
    pub fn score(&mut self) -> Result<Vec<SeatScore>, EngineError> {
        if self.stage != RoundStage::Scoring {
            return Err(EngineError::RoundIncomplete {
                round_index: self.index,
            });
        }
        if let Some((&seat, hand)) = self.hands.iter().find(|(_, hand)| !hand.is_empty()) {
            return Err(EngineError::HandNotEmpty {
                seat,
                remaining: hand.len(),
            });
        }

        let scores = self
            .rotation
            .iter()
            .map(|&seat| {
                let declared = self.declarations.value_of(seat).unwrap_or(0);
                let won = self.tricks_won(seat);
                SeatScore {
                    seat,
                    declared,
                    won,
                    eliminated: declared != won,
                }
            })
            .collect();
        self.stage = RoundStage::Done;
        Ok(scores)
    }
}

fn rotate_to(rotation: &[Seat], leader: Seat) -> Vec<Seat> {
    let start = rotation
        .iter()
        .position(|&seat| seat == leader)
        .unwrap_or(0);
    rotation[start..]
        .iter()
        .chain(&rotation[..start])
        .copied()
        .collect()
}
