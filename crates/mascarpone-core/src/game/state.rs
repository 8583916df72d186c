use crate::error::EngineError;
use crate::game::events::{
    DeclarationRecord, GameResult, PlayRecord, PlayerOutcome, RoundResult, TerminationReason,
    TrickRecord,
};
use crate::game::plan::{PlannedRound, RoundPlan};
use crate::model::card::{Card, Extreme};
use crate::model::deck::{DECK_SIZE, Deck, DeckShortfall};
use crate::model::hand::Hand;
use crate::model::player::{PlayerId, Seat, Seating};
use crate::model::round::{PlayOutcome, RoundState};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{Level, event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameConfig {
    pub seed: u64,
    /// Dealer of the first round; defaults to the last seat so seat 0 opens.
    #[serde(default)]
    pub first_dealer: Option<Seat>,
}

impl GameConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            first_dealer: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Started { round_index: u32, dealer: Seat },
    Finished(GameResult),
}

/// The single owned aggregate for one game: seating, plan, rng and the round in flight.
#[derive(Debug, Clone)]
pub struct GameState {
    config: GameConfig,
    seating: Seating,
    plan: RoundPlan,
    rng: StdRng,
    rounds_started: u32,
    last_dealer: Option<Seat>,
    round: Option<RoundState>,
    results: Vec<RoundResult>,
    result: Option<GameResult>,
}

pub fn start_game<I, P>(roster: I, config: GameConfig) -> Result<GameState, EngineError>
where
    I: IntoIterator<Item = P>,
    P: Into<PlayerId>,
{
    GameState::new(roster.into_iter().map(Into::into).collect(), config)
}

impl GameState {
    pub fn new(roster: Vec<PlayerId>, config: GameConfig) -> Result<Self, EngineError> {
        let seating = Seating::from_roster(roster)?;
        if let Some(dealer) = config.first_dealer {
            if dealer.index() >= seating.len() {
                return Err(EngineError::InvalidRoster {
                    count: seating.len(),
                    reason: format!("first dealer {dealer} is not at the table"),
                });
            }
        }

        if tracing::enabled!(Level::INFO) {
            let roster = seating
                .players()
                .iter()
                .map(|player| player.id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            event!(
                target: "mascarpone_core::game",
                Level::INFO,
                seed = config.seed,
                players = seating.len(),
                roster = %roster,
                "game started"
            );
        }

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            seating,
            plan: RoundPlan::new(),
            rounds_started: 0,
            last_dealer: None,
            round: None,
            results: Vec::new(),
            result: None,
        })
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    pub fn seating(&self) -> &Seating {
        &self.seating
    }

    pub fn plan(&self) -> &RoundPlan {
        &self.plan
    }

    pub fn player_id(&self, seat: Seat) -> Option<&PlayerId> {
        self.seating.player(seat).map(|player| &player.id)
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn rounds_started(&self) -> u32 {
        self.rounds_started
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// Dealer of the next round: the configured seat first, then the next active seat
    /// clockwise from the previous dealer.
    pub fn next_dealer(&self) -> Option<Seat> {
        match self.last_dealer {
            Some(previous) => self.seating.next_active_after(previous),
            None => {
                let last_seat = Seat::new((self.seating.len() - 1) as u8);
                let seat = self.config.first_dealer.unwrap_or(last_seat);
                if self.seating.is_active(seat) {
                    Some(seat)
                } else {
                    self.seating.next_active_after(seat)
                }
            }
        }
    }

    /// Checks for a finished game and otherwise deals the next planned round.
    pub fn begin_round(&mut self) -> Result<Advance, EngineError> {
        if let Some(finished) = self.pending_termination()? {
            return Ok(finished);
        }

        let round_index = self.rounds_started + 1;
        let active = self.seating.active_count();
        let planned = match self.plan.require_next(active, round_index) {
            Ok(planned) => planned,
            Err(EngineError::PlanExhausted { .. }) => {
                event!(
                    target: "mascarpone_core::game",
                    Level::WARN,
                    round_index,
                    active_players = active,
                    "round plan exhausted with several players left"
                );
                return Ok(Advance::Finished(
                    self.finish(TerminationReason::PlanExhausted),
                ));
            }
            Err(other) => return Err(other),
        };

        let deck = Deck::shuffled(&mut self.rng);
        self.install_round(round_index, planned, |rotation| {
            RoundState::deal(round_index, planned, rotation, &deck)
        })
    }

    /// Starts a round from hands dealt outside the engine (a physical table, a test
    /// fixture). The round plan is not consulted.
    pub fn begin_round_with_hands(
        &mut self,
        planned: PlannedRound,
        hands: Vec<(Seat, Hand)>,
    ) -> Result<Advance, EngineError> {
        if let Some(finished) = self.pending_termination()? {
            return Ok(finished);
        }

        let round_index = self.rounds_started + 1;
        let active = self.seating.active_count();
        if !planned.fits(active) {
            return Err(EngineError::DealUnderflow {
                round_index,
                source: DeckShortfall {
                    players: active,
                    cards_per_hand: planned.cards_per_hand,
                    available: DECK_SIZE,
                },
            });
        }
        self.install_round(round_index, planned, |rotation| {
            RoundState::from_hands(round_index, planned, rotation, hands)
        })
    }

    pub fn declare(&mut self, seat: Seat, value: u8) -> Result<(), EngineError> {
        self.round
            .as_mut()
            .ok_or(EngineError::NoRoundInProgress)?
            .declare(seat, value)
    }

    pub fn play_card(
        &mut self,
        seat: Seat,
        card: Card,
        extreme: Option<Extreme>,
    ) -> Result<PlayOutcome, EngineError> {
        self.round
            .as_mut()
            .ok_or(EngineError::NoRoundInProgress)?
            .play_card(seat, card, extreme)
    }

    /// Scores the finished round, eliminates every mismatched player, and records the
    /// round result.
    pub fn finish_round(&mut self) -> Result<RoundResult, EngineError> {
        let scores = self
            .round
            .as_mut()
            .ok_or(EngineError::NoRoundInProgress)?
            .score()?;
        let round = self.round.take().ok_or(EngineError::NoRoundInProgress)?;

        let players = scores
            .iter()
            .map(|score| PlayerOutcome {
                player: self.id_or_seat(score.seat),
                seat: score.seat,
                declared: score.declared,
                won: score.won,
                eliminated: score.eliminated,
            })
            .collect();
        let declarations = round
            .declarations()
            .made()
            .iter()
            .map(|declaration| DeclarationRecord {
                player: self.id_or_seat(declaration.seat),
                seat: declaration.seat,
                value: declaration.value,
            })
            .collect();
        let tricks = round
            .trick_history()
            .iter()
            .map(|completed| TrickRecord {
                plays: completed
                    .trick
                    .plays()
                    .iter()
                    .map(|play| PlayRecord {
                        player: self.id_or_seat(play.seat),
                        seat: play.seat,
                        card: play.played.card(),
                        extreme: play.played.extreme(),
                    })
                    .collect(),
                winner: self.id_or_seat(completed.winner),
            })
            .collect();

        let result = RoundResult {
            round_index: round.index(),
            phase: round.phase(),
            cards_per_hand: round.cards_per_hand(),
            dealer: self.id_or_seat(round.dealer()),
            players,
            declarations,
            tricks,
        };

        for score in scores.iter().filter(|score| score.eliminated) {
            self.seating.eliminate(score.seat, round.index());
        }

        if tracing::enabled!(Level::INFO) {
            let eliminated = result
                .eliminated()
                .map(PlayerId::as_str)
                .collect::<Vec<_>>()
                .join(",");
            event!(
                target: "mascarpone_core::round",
                Level::INFO,
                round_index = result.round_index,
                phase = %result.phase,
                cards_per_hand = result.cards_per_hand,
                dealer = %result.dealer,
                declared_total = result.declared_total(),
                eliminated = %eliminated,
                active_players = self.seating.active_count(),
                "round finished"
            );
        }

        self.results.push(result.clone());
        Ok(result)
    }

    fn pending_termination(&mut self) -> Result<Option<Advance>, EngineError> {
        if let Some(result) = &self.result {
            return Ok(Some(Advance::Finished(result.clone())));
        }
        if let Some(round) = &self.round {
            return Err(EngineError::RoundIncomplete {
                round_index: round.index(),
            });
        }
        let finished = match self.seating.active_count() {
            0 => Some(self.finish(TerminationReason::AllEliminated)),
            1 => Some(self.finish(TerminationReason::LastSurvivor)),
            _ => None,
        };
        Ok(finished.map(Advance::Finished))
    }

    fn install_round<F>(
        &mut self,
        round_index: u32,
        planned: PlannedRound,
        build: F,
    ) -> Result<Advance, EngineError>
    where
        F: FnOnce(Vec<Seat>) -> Result<RoundState, EngineError>,
    {
        let dealer = self.next_dealer().ok_or(EngineError::GameOver)?;
        let round = build(self.seating.rotation_after(dealer))?;

        event!(
            target: "mascarpone_core::round",
            Level::DEBUG,
            round_index,
            phase = %planned.phase,
            cards_per_hand = planned.cards_per_hand,
            dealer = %dealer,
            active_players = self.seating.active_count(),
            "round dealt"
        );

        self.round = Some(round);
        self.rounds_started = round_index;
        self.last_dealer = Some(dealer);
        Ok(Advance::Started {
            round_index,
            dealer,
        })
    }

    fn finish(&mut self, reason: TerminationReason) -> GameResult {
        let remaining: Vec<PlayerId> = self
            .seating
            .active_players()
            .map(|player| player.id.clone())
            .collect();
        let winner = match reason {
            TerminationReason::LastSurvivor => remaining.first().cloned(),
            TerminationReason::AllEliminated | TerminationReason::PlanExhausted => None,
        };
        let result = GameResult {
            winner,
            reason,
            rounds_played: self.results.len() as u32,
            remaining,
        };

        event!(
            target: "mascarpone_core::game",
            Level::INFO,
            winner = result.winner.as_ref().map(PlayerId::as_str).unwrap_or("none"),
            reason = ?result.reason,
            rounds_played = result.rounds_played,
            "game over"
        );

        self.result = Some(result.clone());
        result
    }

    fn id_or_seat(&self, seat: Seat) -> PlayerId {
        self.player_id(seat)
            .cloned()
            .unwrap_or_else(|| PlayerId::new(seat.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Advance, GameConfig, GameState, start_game};
    use crate::error::EngineError;
    use crate::game::events::TerminationReason;
    use crate::game::plan::{Phase, PlannedRound, RoundPlan};
    use crate::model::card::{Card, Extreme};
    use crate::model::hand::Hand;
    use crate::model::player::{PlayerId, Seat};
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    fn game(players: usize, seed: u64) -> GameState {
        let roster = (0..players).map(|i| format!("p{i}"));
        start_game(roster, GameConfig::with_seed(seed)).unwrap()
    }

    #[test]
    fn start_game_validates_the_roster() {
        assert!(matches!(
            start_game(["solo"], GameConfig::default()),
            Err(EngineError::InvalidRoster { count: 1, .. })
        ));
        let config = GameConfig {
            seed: 0,
            first_dealer: Some(Seat::new(4)),
        };
        assert!(matches!(
            start_game(["a", "b"], config),
            Err(EngineError::InvalidRoster { .. })
        ));
    }

    #[test]
    fn first_round_is_dealt_by_the_last_seat() {
        let mut state = game(4, 1);
        let advance = state.begin_round().unwrap();
        assert_eq!(
            advance,
            Advance::Started {
                round_index: 1,
                dealer: Seat::new(3)
            }
        );
        let round = state.round().unwrap();
        assert_eq!(round.cards_per_hand(), 5);
        assert_eq!(round.declaring_seat(), Some(Seat::new(0)));
    }

    #[test]
    fn cannot_begin_a_round_while_one_is_in_flight() {
        let mut state = game(3, 1);
        state.begin_round().unwrap();
        assert_eq!(
            state.begin_round(),
            Err(EngineError::RoundIncomplete { round_index: 1 })
        );
    }

    #[test]
    fn scenario_game_ends_with_the_matching_player_winning() {
        let mut state = start_game(["A", "B"], GameConfig::with_seed(0)).unwrap();
        let hands = vec![
            (
                Seat::new(0),
                Hand::with_cards(vec![
                    Card::new(Rank::Two, Suit::Spades),
                    Card::new(Rank::King, Suit::Hearts),
                ]),
            ),
            (
                Seat::new(1),
                Hand::with_cards(vec![
                    Card::ACE_OF_HEARTS,
                    Card::new(Rank::Seven, Suit::Diamonds),
                ]),
            ),
        ];
        state
            .begin_round_with_hands(PlannedRound::new(Phase::Descending, 2), hands)
            .unwrap();
        assert_eq!(state.round().unwrap().dealer(), Seat::new(1));

        state.declare(Seat::new(0), 1).unwrap();
        assert!(state.declare(Seat::new(1), 1).is_err());
        state.declare(Seat::new(1), 2).unwrap();
        state
            .play_card(Seat::new(0), Card::new(Rank::Two, Suit::Spades), None)
            .unwrap();
        state
            .play_card(Seat::new(1), Card::ACE_OF_HEARTS, Some(Extreme::High))
            .unwrap();
        state
            .play_card(Seat::new(1), Card::new(Rank::Seven, Suit::Diamonds), None)
            .unwrap();
        state
            .play_card(Seat::new(0), Card::new(Rank::King, Suit::Hearts), None)
            .unwrap();

        let round = state.finish_round().unwrap();
        assert_eq!(
            round.eliminated().collect::<Vec<_>>(),
            vec![&PlayerId::new("B")]
        );
        assert_eq!(round.tricks.len(), 2);
        assert_eq!(round.tricks[0].winner, PlayerId::new("B"));
        assert_eq!(round.tricks[1].winner, PlayerId::new("A"));

        match state.begin_round().unwrap() {
            Advance::Finished(result) => {
                assert_eq!(result.winner, Some(PlayerId::new("A")));
                assert_eq!(result.reason, TerminationReason::LastSurvivor);
                assert_eq!(result.rounds_played, 1);
            }
            other => panic!("expected the game to end, got {other:?}"),
        }
        assert!(state.is_over());
    }

    #[test]
    fn everyone_missing_in_the_same_round_leaves_no_winner() {
        let mut state = start_game(["A", "B"], GameConfig::with_seed(0)).unwrap();
        let hands = vec![
            (
                Seat::new(0),
                Hand::with_cards(vec![
                    Card::new(Rank::Two, Suit::Spades),
                    Card::new(Rank::King, Suit::Hearts),
                ]),
            ),
            (
                Seat::new(1),
                Hand::with_cards(vec![
                    Card::new(Rank::Three, Suit::Spades),
                    Card::new(Rank::Two, Suit::Diamonds),
                ]),
            ),
        ];
        state
            .begin_round_with_hands(PlannedRound::new(Phase::Descending, 2), hands)
            .unwrap();
        state.declare(Seat::new(0), 2).unwrap();
        state.declare(Seat::new(1), 2).unwrap();
        state
            .play_card(Seat::new(0), Card::new(Rank::Two, Suit::Spades), None)
            .unwrap();
        state
            .play_card(Seat::new(1), Card::new(Rank::Three, Suit::Spades), None)
            .unwrap();
        state
            .play_card(Seat::new(1), Card::new(Rank::Two, Suit::Diamonds), None)
            .unwrap();
        state
            .play_card(Seat::new(0), Card::new(Rank::King, Suit::Hearts), None)
            .unwrap();
        let round = state.finish_round().unwrap();
        assert_eq!(round.eliminated().count(), 2);

        match state.begin_round().unwrap() {
            Advance::Finished(result) => {
                assert_eq!(result.winner, None);
                assert_eq!(result.reason, TerminationReason::AllEliminated);
                assert!(result.remaining.is_empty());
            }
            other => panic!("expected the game to end, got {other:?}"),
        }
    }

    #[test]
    fn round_actions_need_a_round_in_flight() {
        let mut state = game(2, 0);
        assert_eq!(
            state.declare(Seat::new(0), 1),
            Err(EngineError::NoRoundInProgress)
        );
        assert_eq!(
            state.finish_round(),
            Err(EngineError::NoRoundInProgress)
        );
    }

    #[test]
    fn dealer_rotation_skips_eliminated_seats() {
        let mut state = game(4, 3);
        state.begin_round().unwrap();
        assert_eq!(state.round().unwrap().dealer(), Seat::new(3));
        state.seating.eliminate(Seat::new(0), 1);
        state.round = None;
        assert_eq!(state.next_dealer(), Some(Seat::new(1)));
    }

    #[test]
    fn exhausted_plan_ends_the_game_without_a_winner() {
        // Every played round eliminates someone, so only a drained plan reaches this.
        let mut state = game(2, 8);
        while state.plan.next_for(2).is_some() {}
        assert_eq!(state.plan().consumed(), RoundPlan::schedule().len());

        match state.begin_round().unwrap() {
            Advance::Finished(result) => {
                assert_eq!(result.reason, TerminationReason::PlanExhausted);
                assert_eq!(result.winner, None);
                assert_eq!(result.remaining.len(), 2);
                assert_eq!(result.rounds_played, 0);
            }
            other => panic!("expected the game to end, got {other:?}"),
        }
        assert!(state.is_over());
        assert!(state.round().is_none());
    }

    #[test]
    fn eliminated_seats_cannot_be_handed_cards() {
        let mut state = game(3, 0);
        state.seating.eliminate(Seat::new(2), 1);
        let one = |rank| Hand::with_cards(vec![Card::new(rank, Suit::Clubs)]);
        let planned = PlannedRound::new(Phase::Descending, 1);

        let err = state
            .begin_round_with_hands(
                planned,
                vec![
                    (Seat::new(0), one(Rank::Two)),
                    (Seat::new(1), one(Rank::Three)),
                    (Seat::new(2), one(Rank::Four)),
                ],
            )
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidHand {
                seat: Seat::new(2),
                expected: 0,
                found: 1,
            }
        );
        assert!(state.round().is_none());
        assert_eq!(state.rounds_started(), 0);

        state
            .begin_round_with_hands(
                planned,
                vec![
                    (Seat::new(0), one(Rank::Two)),
                    (Seat::new(1), one(Rank::Three)),
                ],
            )
            .unwrap();
        assert_eq!(state.round().unwrap().dealer(), Seat::new(0));
    }
}
