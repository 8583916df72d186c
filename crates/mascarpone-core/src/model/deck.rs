use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

pub const DECK_SIZE: usize = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot deal {cards_per_hand} cards to {players} players from {available} cards")]
pub struct DeckShortfall {
    pub players: usize,
    pub cards_per_hand: u8,
    pub available: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn standard() -> Self {
        let cards = Suit::ALL
            .iter()
            .flat_map(|&suit| Rank::ORDERED.iter().map(move |&rank| Card::new(rank, suit)))
            .collect();
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Splits the top of the deck into `players` consecutive hands in seat order; the rest
    /// of the deck is left undealt.
    pub fn deal(&self, players: usize, cards_per_hand: u8) -> Result<Vec<Hand>, DeckShortfall> {
        let per_hand = usize::from(cards_per_hand);
        if players * per_hand > self.cards.len() {
            return Err(DeckShortfall {
                players,
                cards_per_hand,
                available: self.cards.len(),
            });
        }

        if per_hand == 0 {
            return Ok(vec![Hand::new(); players]);
        }

        Ok(self
            .cards
            .chunks(per_hand)
            .take(players)
            .map(|chunk| Hand::with_cards(chunk.to_vec()))
            .collect())
    }
}
