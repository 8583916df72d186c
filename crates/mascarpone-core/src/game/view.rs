use crate::error::EngineError;
use crate::game::plan::Phase;
use crate::game::state::GameState;
use crate::model::card::{Card, Extreme};
use crate::model::player::{PlayerId, Seat};
use crate::model::round::RoundStage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentView {
    pub player: PlayerId,
    pub seat: Seat,
    pub active: bool,
    pub cards_in_hand: usize,
    pub declared: Option<u8>,
    pub tricks_won: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PileCard {
    pub seat: Seat,
    pub card: Card,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extreme: Option<Extreme>,
}

/// Everything one seat is allowed to know about the round in flight. Other hands are
/// reduced to card counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub seat: Seat,
    pub player: PlayerId,
    pub round_index: u32,
    pub phase: Phase,
    pub cards_per_hand: u8,
    pub stage: RoundStage,
    pub dealer: Seat,
    pub hand: Vec<Card>,
    pub declared: Option<u8>,
    pub tricks_won: u8,
    pub table: Vec<OpponentView>,
    pub pile: Vec<PileCard>,
    pub to_act: Option<Seat>,
    pub declares_last: bool,
    /// Only ever set for the dealer.
    pub forbidden: Option<u8>,
}

impl PlayerView {
    pub fn capture(state: &GameState, seat: Seat) -> Result<Self, EngineError> {
        let round = state.round().ok_or(EngineError::NoRoundInProgress)?;
        let player = state
            .player_id(seat)
            .cloned()
            .ok_or_else(|| EngineError::InvalidRoster {
                count: state.seating().len(),
                reason: format!("{seat} is not at the table"),
            })?;
        let book = round.declarations();

        let table = state
            .seating()
            .players()
            .iter()
            .filter(|other| other.seat != seat)
            .map(|other| OpponentView {
                player: other.id.clone(),
                seat: other.seat,
                active: other.active,
                cards_in_hand: round.hand(other.seat).map_or(0, |hand| hand.len()),
                declared: book.value_of(other.seat),
                tricks_won: round.tricks_won(other.seat),
            })
            .collect();
        let pile = round
            .current_trick()
            .plays()
            .iter()
            .map(|play| PileCard {
                seat: play.seat,
                card: play.played.card(),
                extreme: play.played.extreme(),
            })
            .collect();
        let to_act = match round.stage() {
            RoundStage::Declaring => round.declaring_seat(),
            RoundStage::Playing => round.current_player(),
            RoundStage::Scoring | RoundStage::Done => None,
        };

        Ok(Self {
            seat,
            player,
            round_index: round.index(),
            phase: round.phase(),
            cards_per_hand: round.cards_per_hand(),
            stage: round.stage(),
            dealer: round.dealer(),
            hand: round
                .hand(seat)
                .map(|hand| hand.cards().to_vec())
                .unwrap_or_default(),
            declared: book.value_of(seat),
            tricks_won: round.tricks_won(seat),
            table,
            pile,
            to_act,
            declares_last: round.dealer() == seat,
            forbidden: book.forbidden_for(seat),
        })
    }

    pub fn is_my_turn(&self) -> bool {
        self.to_act == Some(self.seat)
    }
}

#[cfg(test)]
mod tests {
    use super::PlayerView;
    use crate::error::EngineError;
    use crate::game::state::{GameConfig, start_game};
    use crate::model::player::Seat;
    use crate::model::round::RoundStage;

    #[test]
    fn view_hides_other_hands() {
        let mut state = start_game(["a", "b", "c"], GameConfig::with_seed(21)).unwrap();
        assert_eq!(
            PlayerView::capture(&state, Seat::new(0)),
            Err(EngineError::NoRoundInProgress)
        );
        state.begin_round().unwrap();

        let view = PlayerView::capture(&state, Seat::new(0)).unwrap();
        assert_eq!(view.hand.len(), 5);
        assert_eq!(view.table.len(), 2);
        assert!(view.table.iter().all(|other| other.cards_in_hand == 5));
        assert_eq!(view.stage, RoundStage::Declaring);
        assert!(view.is_my_turn());
        assert!(!view.declares_last);
        assert_eq!(view.forbidden, None);

        let json = serde_json::to_string(&view).unwrap();
        let other_hand = state.round().unwrap().hand(Seat::new(1)).unwrap();
        for card in other_hand.iter() {
            assert!(!view.hand.contains(card));
        }
        assert!(json.contains("\"cards_in_hand\":5"));
    }

    #[test]
    fn dealer_sees_the_forbidden_value_once_it_is_their_turn() {
        let mut state = start_game(["a", "b"], GameConfig::with_seed(4)).unwrap();
        state.begin_round().unwrap();
        state.declare(Seat::new(0), 2).unwrap();

        let view = PlayerView::capture(&state, Seat::new(1)).unwrap();
        assert!(view.declares_last);
        assert!(view.is_my_turn());
        assert_eq!(view.forbidden, Some(3));
        assert_eq!(view.table[0].declared, Some(2));
    }
}
