use crate::model::card::Card;
use crate::model::deck::DeckShortfall;
use crate::model::player::Seat;
use thiserror::Error;

/// Every failure the engine reports. Declaration and play rejections are recoverable and
/// leave the game untouched; the remaining variants abort the operation that raised them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid roster of {count} players: {reason}")]
    InvalidRoster { count: usize, reason: String },
    #[error("{seat} cannot declare {value}: {reason}")]
    IllegalDeclaration {
        seat: Seat,
        value: u8,
        reason: DeclarationRejection,
    },
    #[error("{seat} cannot play: {reason}")]
    IllegalPlay { seat: Seat, reason: PlayRejection },
    #[error(
        "round plan exhausted before round {round_index} with {active_players} players still active"
    )]
    PlanExhausted {
        round_index: u32,
        active_players: usize,
    },
    #[error("round {round_index}: {source}")]
    DealUnderflow {
        round_index: u32,
        #[source]
        source: DeckShortfall,
    },
    #[error("rounds must deal at least one card per player")]
    ZeroCardRound,
    #[error("{seat} holds {found} cards but the round deals {expected}")]
    InvalidHand {
        seat: Seat,
        expected: u8,
        found: usize,
    },
    #[error("{seat} still holds {remaining} cards at the end of the round")]
    HandNotEmpty { seat: Seat, remaining: usize },
    #[error("card {0} appears more than once")]
    DuplicateCard(Card),
    #[error("a trick without plays has no winner")]
    EmptyTrick,
    #[error("no round is in progress")]
    NoRoundInProgress,
    #[error("round {round_index} is still being played")]
    RoundIncomplete { round_index: u32 },
    #[error("the game is already over")]
    GameOver,
    #[error("{seat} gave no acceptable input after {attempts} attempts")]
    ParticipantStalled { seat: Seat, attempts: u32 },
}

impl EngineError {
    /// Recoverable errors reject a single input and never abort the round.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::IllegalDeclaration { .. } | EngineError::IllegalPlay { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeclarationRejection {
    #[error("declarations are closed")]
    NotDeclaring,
    #[error("it is {expected}'s turn to declare")]
    OutOfTurn { expected: Seat },
    #[error("value must be between 0 and {max}")]
    OutOfRange { max: u8 },
    #[error("the dealer may not bring the total to {cards_per_hand}")]
    ForbiddenTotal { cards_per_hand: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlayRejection {
    #[error("cards are not being played right now")]
    NotPlaying,
    #[error("it is {expected}'s turn to play")]
    OutOfTurn { expected: Seat },
    #[error("{0} is not in hand")]
    NotInHand(Card),
    #[error("the Ace of Hearts must be played high or low")]
    MissingExtreme,
    #[error("only the Ace of Hearts takes a high/low choice, not {0}")]
    UnexpectedExtreme(Card),
    #[error("the trick is already complete")]
    TrickComplete,
    #[error("{0} is already on the table")]
    AlreadyPlayed(Card),
}
