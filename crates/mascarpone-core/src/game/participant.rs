use crate::error::EngineError;
use crate::game::events::RoundResult;
use crate::game::state::GameState;
use crate::model::card::{Card, Extreme};
use crate::model::declaration::{Declaration, legal_declarations};
use crate::model::hand::Hand;
use crate::model::player::{PlayerId, Seat};
use crate::model::trick::Trick;
use std::collections::VecDeque;

/// What a participant sees when asked for a declaration.
#[derive(Debug, Clone)]
pub struct DeclarationContext<'a> {
    pub seat: Seat,
    pub player: &'a PlayerId,
    pub round_index: u32,
    pub cards_per_hand: u8,
    pub hand: &'a Hand,
    /// Declarations already made this round, in declaration order.
    pub declarations: &'a [Declaration],
    pub is_dealer: bool,
    pub forbidden: Option<u8>,
}

impl<'a> DeclarationContext<'a> {
    pub fn for_seat(state: &'a GameState, seat: Seat) -> Result<Self, EngineError> {
        let round = state.round().ok_or(EngineError::NoRoundInProgress)?;
        let player = state.player_id(seat).ok_or(EngineError::NoRoundInProgress)?;
        let hand = round.hand(seat).ok_or(EngineError::NoRoundInProgress)?;
        let book = round.declarations();
        Ok(Self {
            seat,
            player,
            round_index: round.index(),
            cards_per_hand: round.cards_per_hand(),
            hand,
            declarations: book.made(),
            is_dealer: round.dealer() == seat,
            forbidden: book.forbidden_for(seat),
        })
    }

    pub fn declared_so_far(&self) -> u32 {
        self.declarations.iter().map(|d| u32::from(d.value)).sum()
    }

    pub fn legal_values(&self) -> Vec<u8> {
        legal_declarations(self.cards_per_hand, self.declared_so_far(), self.is_dealer)
    }
}

/// What a participant sees when asked for a card.
#[derive(Debug, Clone)]
pub struct PlayContext<'a> {
    pub seat: Seat,
    pub player: &'a PlayerId,
    pub round_index: u32,
    pub cards_per_hand: u8,
    pub hand: &'a Hand,
    pub trick: &'a Trick,
    pub declarations: &'a [Declaration],
    pub declared: u8,
    pub won: u8,
}

impl<'a> PlayContext<'a> {
    pub fn for_seat(state: &'a GameState, seat: Seat) -> Result<Self, EngineError> {
        let round = state.round().ok_or(EngineError::NoRoundInProgress)?;
        let player = state.player_id(seat).ok_or(EngineError::NoRoundInProgress)?;
        let hand = round.hand(seat).ok_or(EngineError::NoRoundInProgress)?;
        Ok(Self {
            seat,
            player,
            round_index: round.index(),
            cards_per_hand: round.cards_per_hand(),
            hand,
            trick: round.current_trick(),
            declarations: round.declarations().made(),
            declared: round.declarations().value_of(seat).unwrap_or(0),
            won: round.tricks_won(seat),
        })
    }

    pub fn is_leading(&self) -> bool {
        self.trick.plays().is_empty()
    }

    pub fn tricks_needed(&self) -> i32 {
        i32::from(self.declared) - i32::from(self.won)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayChoice {
    pub card: Card,
    pub extreme: Option<Extreme>,
}

impl PlayChoice {
    pub const fn card(card: Card) -> Self {
        Self {
            card,
            extreme: None,
        }
    }

    pub const fn ace_of_hearts(extreme: Extreme) -> Self {
        Self {
            card: Card::ACE_OF_HEARTS,
            extreme: Some(extreme),
        }
    }
}

/// Anything that can take a seat: a remote human, a bot, or a recorded script.
/// Rejected inputs are reported through `on_rejected` and requested again.
pub trait Participant {
    fn request_declaration(&mut self, ctx: &DeclarationContext<'_>) -> u8;

    fn request_play(&mut self, ctx: &PlayContext<'_>) -> PlayChoice;

    fn on_rejected(&mut self, _error: &EngineError) {}

    fn on_round_result(&mut self, _result: &RoundResult) {}
}

/// Replays recorded inputs in order. Once the script runs dry it declares the lowest
/// legal value and plays its weakest card, with the Ace of Hearts low.
#[derive(Debug, Clone, Default)]
pub struct ScriptedParticipant {
    declarations: VecDeque<u8>,
    plays: VecDeque<PlayChoice>,
}

impl ScriptedParticipant {
    pub fn new(declarations: Vec<u8>, plays: Vec<PlayChoice>) -> Self {
        Self {
            declarations: declarations.into(),
            plays: plays.into(),
        }
    }

    /// Collects every input `player` made across the recorded rounds.
    pub fn from_transcript(player: &PlayerId, rounds: &[RoundResult]) -> Self {
        let declarations = rounds
            .iter()
            .flat_map(|round| round.declarations.iter())
            .filter(|record| &record.player == player)
            .map(|record| record.value)
            .collect();
        let plays = rounds
            .iter()
            .flat_map(|round| round.tricks.iter())
            .flat_map(|trick| trick.plays.iter())
            .filter(|record| &record.player == player)
            .map(|record| PlayChoice {
                card: record.card,
                extreme: record.extreme,
            })
            .collect();
        Self::new(declarations, plays)
    }
}

impl Participant for ScriptedParticipant {
    fn request_declaration(&mut self, ctx: &DeclarationContext<'_>) -> u8 {
        self.declarations
            .pop_front()
            .unwrap_or_else(|| ctx.legal_values().first().copied().unwrap_or(0))
    }

    fn request_play(&mut self, ctx: &PlayContext<'_>) -> PlayChoice {
        if let Some(choice) = self.plays.pop_front() {
            return choice;
        }
        match ctx.hand.cards().first().copied() {
            Some(card) if card.is_ace_of_hearts() => PlayChoice::ace_of_hearts(Extreme::Low),
            Some(card) => PlayChoice::card(card),
            None => PlayChoice::ace_of_hearts(Extreme::Low),
        }
    }
}
