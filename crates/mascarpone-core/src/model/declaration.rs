use crate::error::{DeclarationRejection, EngineError};
use crate::model::player::Seat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub seat: Seat,
    pub value: u8,
}

/// The one value the dealer may not choose, if any. `None` when the others already
/// declared more than the round holds.
pub fn forbidden_dealer_value(cards_per_hand: u8, prior_total: u32) -> Option<u8> {
    u32::from(cards_per_hand)
        .checked_sub(prior_total)
        .and_then(|value| u8::try_from(value).ok())
}

pub fn legal_declarations(cards_per_hand: u8, prior_total: u32, is_dealer: bool) -> Vec<u8> {
    let forbidden = is_dealer
        .then(|| forbidden_dealer_value(cards_per_hand, prior_total))
        .flatten();
    (0..=cards_per_hand)
        .filter(|value| Some(*value) != forbidden)
        .collect()
}

/// Declarations for one round, taken clockwise from the seat after the dealer and ending
/// with the dealer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarations {
    cards_per_hand: u8,
    order: Vec<Seat>,
    made: Vec<Declaration>,
}

impl Declarations {
    pub fn new(cards_per_hand: u8, order: Vec<Seat>) -> Self {
        Self {
            cards_per_hand,
            made: Vec::with_capacity(order.len()),
            order,
        }
    }

    pub fn dealer(&self) -> Option<Seat> {
        self.order.last().copied()
    }

    pub fn expected_seat(&self) -> Option<Seat> {
        self.order.get(self.made.len()).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.made.len() == self.order.len()
    }

    pub fn made(&self) -> &[Declaration] {
        &self.made
    }

    pub fn total(&self) -> u32 {
        self.made.iter().map(|d| u32::from(d.value)).sum()
    }

    pub fn value_of(&self, seat: Seat) -> Option<u8> {
        self.made
            .iter()
            .find(|declaration| declaration.seat == seat)
            .map(|declaration| declaration.value)
    }

    /// Forbidden value for `seat` given what has been declared so far.
    pub fn forbidden_for(&self, seat: Seat) -> Option<u8> {
        if self.dealer() != Some(seat) {
            return None;
        }
        forbidden_dealer_value(self.cards_per_hand, self.total())
    }

    pub fn legal_for(&self, seat: Seat) -> Vec<u8> {
        legal_declarations(
            self.cards_per_hand,
            self.total(),
            self.dealer() == Some(seat),
        )
    }

    pub fn validate(&self, seat: Seat, value: u8) -> Result<(), EngineError> {
        let reject = |reason| EngineError::IllegalDeclaration {
            seat,
            value,
            reason,
        };

        let expected = self
            .expected_seat()
            .ok_or(reject(DeclarationRejection::NotDeclaring))?;
        if expected != seat {
            return Err(reject(DeclarationRejection::OutOfTurn { expected }));
        }
        if value > self.cards_per_hand {
            return Err(reject(DeclarationRejection::OutOfRange {
                max: self.cards_per_hand,
            }));
        }
        if self.forbidden_for(seat) == Some(value) {
            return Err(reject(DeclarationRejection::ForbiddenTotal {
                cards_per_hand: self.cards_per_hand,
            }));
        }
        Ok(())
    }

    pub fn submit(&mut self, seat: Seat, value: u8) -> Result<(), EngineError> {
        self.validate(seat, value)?;
        self.made.push(Declaration { seat, value });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Declarations, forbidden_dealer_value, legal_declarations};
    use crate::error::{DeclarationRejection, EngineError};
    use crate::model::player::Seat;

    fn seats(indices: &[u8]) -> Vec<Seat> {
        indices.iter().copied().map(Seat::new).collect()
    }

    #[test]
    fn dealer_set_excludes_the_value_completing_the_total() {
        assert_eq!(legal_declarations(3, 2, true), vec![0, 2, 3]);
        assert_eq!(legal_declarations(3, 2, false), vec![0, 1, 2, 3]);
    }

    #[test]
    fn nothing_is_forbidden_once_the_table_overbids() {
        assert_eq!(forbidden_dealer_value(3, 5), None);
        assert_eq!(legal_declarations(3, 5, true), vec![0, 1, 2, 3]);
    }

    #[test]
    fn declarations_follow_rotation() {
        let mut book = Declarations::new(2, seats(&[0, 1]));
        let err = book.submit(Seat::new(1), 0).unwrap_err();
        assert!(matches!(
            err,
            EngineError::IllegalDeclaration {
                reason: DeclarationRejection::OutOfTurn { .. },
                ..
            }
        ));
        book.submit(Seat::new(0), 1).unwrap();
        assert_eq!(book.expected_seat(), Some(Seat::new(1)));
    }

    #[test]
    fn rejected_declaration_leaves_the_book_untouched() {
        let mut book = Declarations::new(2, seats(&[0, 1]));
        book.submit(Seat::new(0), 1).unwrap();
        let before = book.clone();

        let err = book.submit(Seat::new(1), 1).unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(
            err,
            EngineError::IllegalDeclaration {
                reason: DeclarationRejection::ForbiddenTotal { cards_per_hand: 2 },
                ..
            }
        ));
        assert!(book.submit(Seat::new(1), 3).is_err());
        assert_eq!(book, before);

        book.submit(Seat::new(1), 2).unwrap();
        assert!(book.is_complete());
        assert_eq!(book.total(), 3);
        assert!(matches!(
            book.submit(Seat::new(0), 0),
            Err(EngineError::IllegalDeclaration {
                reason: DeclarationRejection::NotDeclaring,
                ..
            })
        ));
    }
}
