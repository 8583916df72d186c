use crate::error::{EngineError, PlayRejection};
use crate::model::card::PlayedCard;
use crate::model::player::Seat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub seat: Seat,
    pub played: PlayedCard,
}

/// Strongest play wins; there is no suit to follow, only the global card order.
pub fn resolve_winner(plays: &[Play]) -> Result<Seat, EngineError> {
    let (first, rest) = plays.split_first().ok_or(EngineError::EmptyTrick)?;
    let mut best = first;
    for play in rest {
        if play.played.beats(&best.played)? {
            best = play;
        }
    }
    Ok(best.seat)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trick {
    order: Vec<Seat>,
    plays: Vec<Play>,
}

impl Trick {
    /// `order` lists the active seats clockwise starting with the leader.
    pub fn new(order: Vec<Seat>) -> Self {
        Self {
            plays: Vec::with_capacity(order.len()),
            order,
        }
    }

    pub fn leader(&self) -> Option<Seat> {
        self.order.first().copied()
    }

    pub fn order(&self) -> &[Seat] {
        &self.order
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn is_complete(&self) -> bool {
        !self.order.is_empty() && self.plays.len() == self.order.len()
    }

    pub fn expected_seat(&self) -> Option<Seat> {
        self.order.get(self.plays.len()).copied()
    }

    /// Strongest play so far.
    pub fn leading_play(&self) -> Option<&Play> {
        let winner = resolve_winner(&self.plays).ok()?;
        self.plays.iter().find(|play| play.seat == winner)
    }

    pub fn play(&mut self, seat: Seat, played: PlayedCard) -> Result<(), EngineError> {
        let reject = |reason| EngineError::IllegalPlay { seat, reason };

        let expected = self
            .expected_seat()
            .ok_or(reject(PlayRejection::TrickComplete))?;
        if expected != seat {
            return Err(reject(PlayRejection::OutOfTurn { expected }));
        }
        if self
            .plays
            .iter()
            .any(|play| play.played.card() == played.card())
        {
            return Err(reject(PlayRejection::AlreadyPlayed(played.card())));
        }

        self.plays.push(Play { seat, played });
        Ok(())
    }

    pub fn winner(&self) -> Option<Seat> {
        if !self.is_complete() {
            return None;
        }
        resolve_winner(&self.plays).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::{Play, Trick, resolve_winner};
    use crate::error::{EngineError, PlayRejection};
    use crate::model::card::{Card, Extreme, PlayedCard};
    use crate::model::player::Seat;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    fn played(rank: Rank, suit: Suit) -> PlayedCard {
        PlayedCard::new(Card::new(rank, suit), None).unwrap()
    }

    fn order(indices: &[u8]) -> Vec<Seat> {
        indices.iter().copied().map(Seat::new).collect()
    }

    #[test]
    fn plays_follow_turn_order() {
        let mut trick = Trick::new(order(&[2, 0, 1]));
        trick
            .play(Seat::new(2), played(Rank::Two, Suit::Clubs))
            .unwrap();
        assert!(matches!(
            trick.play(Seat::new(1), played(Rank::Three, Suit::Clubs)),
            Err(EngineError::IllegalPlay {
                reason: PlayRejection::OutOfTurn { .. },
                ..
            })
        ));
    }

    #[test]
    fn highest_suit_wins_regardless_of_lead() {
        let mut trick = Trick::new(order(&[0, 1, 2]));
        trick
            .play(Seat::new(0), played(Rank::Ace, Suit::Spades))
            .unwrap();
        trick
            .play(Seat::new(1), played(Rank::Two, Suit::Diamonds))
            .unwrap();
        assert_eq!(trick.winner(), None);
        trick
            .play(Seat::new(2), played(Rank::King, Suit::Clubs))
            .unwrap();

        assert_eq!(trick.winner(), Some(Seat::new(1)));
        assert!(matches!(
            trick.play(Seat::new(0), played(Rank::Four, Suit::Clubs)),
            Err(EngineError::IllegalPlay {
                reason: PlayRejection::TrickComplete,
                ..
            })
        ));
    }

    #[test]
    fn ace_of_hearts_low_never_wins() {
        let plays = [
            Play {
                seat: Seat::new(0),
                played: PlayedCard::ace_of_hearts(Extreme::Low),
            },
            Play {
                seat: Seat::new(1),
                played: played(Rank::Two, Suit::Spades),
            },
        ];
        assert_eq!(resolve_winner(&plays).unwrap(), Seat::new(1));
    }

    #[test]
    fn empty_trick_has_no_winner() {
        assert_eq!(resolve_winner(&[]), Err(EngineError::EmptyTrick));
    }

    #[test]
    fn leading_play_tracks_the_current_best() {
        let mut trick = Trick::new(order(&[0, 1, 2]));
        trick
            .play(Seat::new(0), played(Rank::Nine, Suit::Hearts))
            .unwrap();
        trick
            .play(Seat::new(1), played(Rank::Ace, Suit::Diamonds))
            .unwrap();
        assert_eq!(trick.leading_play().map(|p| p.seat), Some(Seat::new(0)));
    }
}
