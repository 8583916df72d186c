use crate::error::{EngineError, PlayRejection};
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const ACE_OF_HEARTS: Card = Card::new(Rank::Ace, Suit::Hearts);

    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub const fn is_ace_of_hearts(self) -> bool {
        matches!(self.rank, Rank::Ace) && matches!(self.suit, Suit::Hearts)
    }

    /// Position in the fixed deck order, `0` (2S) through `51` (AH).
    pub const fn base_strength(self) -> u8 {
        self.suit.weight() * 13 + (self.rank.value() - 2)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse card from {input:?}")]
pub struct ParseCardError {
    input: String,
}

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || ParseCardError {
            input: s.to_string(),
        };
        let suit_symbol = trimmed.chars().last().ok_or_else(err)?;
        let suit = Suit::from_symbol(suit_symbol).ok_or_else(err)?;
        let rank_part = &trimmed[..trimmed.len() - suit_symbol.len_utf8()];
        let rank = Rank::from_symbol(rank_part).ok_or_else(err)?;
        Ok(Card::new(rank, suit))
    }
}

impl TryFrom<String> for Card {
    type Error = ParseCardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        card.to_string()
    }
}

/// Where the Ace of Hearts sits in the order for one play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extreme {
    High,
    Low,
}

impl fmt::Display for Extreme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extreme::High => f.write_str("high"),
            Extreme::Low => f.write_str("low"),
        }
    }
}

/// A card as it lands on the table. The extreme is present iff the card is the Ace of Hearts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PlayedCardRepr")]
pub struct PlayedCard {
    card: Card,
    #[serde(skip_serializing_if = "Option::is_none")]
    extreme: Option<Extreme>,
}

#[derive(Deserialize)]
struct PlayedCardRepr {
    card: Card,
    #[serde(default)]
    extreme: Option<Extreme>,
}

impl TryFrom<PlayedCardRepr> for PlayedCard {
    type Error = PlayRejection;

    fn try_from(repr: PlayedCardRepr) -> Result<Self, Self::Error> {
        PlayedCard::new(repr.card, repr.extreme)
    }
}

impl PlayedCard {
    pub fn new(card: Card, extreme: Option<Extreme>) -> Result<Self, PlayRejection> {
        match (card.is_ace_of_hearts(), extreme) {
            (true, None) => Err(PlayRejection::MissingExtreme),
            (false, Some(_)) => Err(PlayRejection::UnexpectedExtreme(card)),
            _ => Ok(Self { card, extreme }),
        }
    }

    pub const fn ace_of_hearts(extreme: Extreme) -> Self {
        Self {
            card: Card::ACE_OF_HEARTS,
            extreme: Some(extreme),
        }
    }

    pub const fn card(self) -> Card {
        self.card
    }

    pub const fn extreme(self) -> Option<Extreme> {
        self.extreme
    }

    /// Effective strength: `0` for the Ace of Hearts played low, `53` played high,
    /// otherwise `1..=51` following suit then rank.
    pub const fn strength(self) -> u8 {
        match self.extreme {
            Some(Extreme::High) => 53,
            Some(Extreme::Low) => 0,
            None => self.card.base_strength() + 1,
        }
    }

    pub fn compare(&self, other: &PlayedCard) -> Result<Ordering, EngineError> {
        if self.card == other.card {
            return Err(EngineError::DuplicateCard(self.card));
        }
        Ok(self.strength().cmp(&other.strength()))
    }

    pub fn beats(&self, other: &PlayedCard) -> Result<bool, EngineError> {
        Ok(self.compare(other)? == Ordering::Greater)
    }
}

impl fmt::Display for PlayedCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.extreme {
            Some(extreme) => write!(f, "{}({extreme})", self.card),
            None => write!(f, "{}", self.card),
        }
    }
}
