use crate::error::EngineError;
use crate::game::events::{GameOutcome, GameResult, RoundResult};
use crate::game::participant::{DeclarationContext, Participant, PlayChoice, PlayContext};
use crate::game::state::{Advance, GameState};
use crate::model::player::Seat;
use tracing::{Level, event};

/// How many rejected inputs a participant may send for one request before the game
/// gives up on it.
pub const MAX_INPUT_ATTEMPTS: u32 = 5;

/// Drives a game by pulling declarations and plays from one participant per seat.
pub struct GameController {
    state: GameState,
    participants: Vec<Box<dyn Participant>>,
}

impl GameController {
    pub fn new(
        state: GameState,
        participants: Vec<Box<dyn Participant>>,
    ) -> Result<Self, EngineError> {
        if participants.len() != state.seating().len() {
            return Err(EngineError::InvalidRoster {
                count: participants.len(),
                reason: format!(
                    "{} participants for {} seats",
                    participants.len(),
                    state.seating().len()
                ),
            });
        }
        Ok(Self {
            state,
            participants,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Plays rounds until the game terminates.
    pub fn run(&mut self) -> Result<GameOutcome, EngineError> {
        let result = loop {
            if let Some(result) = self.step()? {
                break result;
            }
        };
        Ok(GameOutcome {
            rounds: self.state.results().to_vec(),
            result,
        })
    }

    /// Plays one full round, or returns the final result if the game is over.
    pub fn step(&mut self) -> Result<Option<GameResult>, EngineError> {
        match self.state.begin_round()? {
            Advance::Finished(result) => Ok(Some(result)),
            Advance::Started { .. } => {
                self.play_current_round()?;
                Ok(None)
            }
        }
    }

    fn play_current_round(&mut self) -> Result<RoundResult, EngineError> {
        self.collect_declarations()?;
        self.play_tricks()?;
        let result = self.state.finish_round()?;
        for participant in &mut self.participants {
            participant.on_round_result(&result);
        }
        Ok(result)
    }

    fn collect_declarations(&mut self) -> Result<(), EngineError> {
        while let Some(seat) = self.state.round().and_then(|round| round.declaring_seat()) {
            let mut attempts = 0;
            loop {
                attempts += 1;
                let value = {
                    let ctx = DeclarationContext::for_seat(&self.state, seat)?;
                    seat_participant(&mut self.participants, seat)?.request_declaration(&ctx)
                };
                match self.state.declare(seat, value) {
                    Ok(()) => break,
                    Err(err) => self.reject(seat, err, attempts)?,
                }
            }
        }
        Ok(())
    }

    fn play_tricks(&mut self) -> Result<(), EngineError> {
        while let Some(seat) = self.state.round().and_then(|round| round.current_player()) {
            let mut attempts = 0;
            loop {
                attempts += 1;
                let PlayChoice { card, extreme } = {
                    let ctx = PlayContext::for_seat(&self.state, seat)?;
                    seat_participant(&mut self.participants, seat)?.request_play(&ctx)
                };
                match self.state.play_card(seat, card, extreme) {
                    Ok(_) => break,
                    Err(err) => self.reject(seat, err, attempts)?,
                }
            }
        }
        Ok(())
    }

    /// Recoverable rejections go back to the participant until the attempt budget runs
    /// out; anything else aborts the game.
    fn reject(&mut self, seat: Seat, err: EngineError, attempts: u32) -> Result<(), EngineError> {
        if !err.is_recoverable() {
            return Err(err);
        }
        event!(
            target: "mascarpone_core::input",
            Level::DEBUG,
            seat = %seat,
            attempts,
            error = %err,
            "input rejected"
        );
        seat_participant(&mut self.participants, seat)?.on_rejected(&err);
        if attempts >= MAX_INPUT_ATTEMPTS {
            event!(
                target: "mascarpone_core::input",
                Level::WARN,
                seat = %seat,
                attempts,
                "participant stalled"
            );
            return Err(EngineError::ParticipantStalled { seat, attempts });
        }
        Ok(())
    }
}

fn seat_participant(
    participants: &mut [Box<dyn Participant>],
    seat: Seat,
) -> Result<&mut Box<dyn Participant>, EngineError> {
    let count = participants.len();
    participants
        .get_mut(seat.index())
        .ok_or_else(|| EngineError::InvalidRoster {
            count,
            reason: format!("no participant for {seat}"),
        })
}

#[cfg(test)]
mod tests {
    use super::{GameController, MAX_INPUT_ATTEMPTS};
    use crate::error::EngineError;
    use crate::game::events::TerminationReason;
    use crate::game::participant::{
        DeclarationContext, Participant, PlayChoice, PlayContext, ScriptedParticipant,
    };
    use crate::game::state::{GameConfig, start_game};
    use crate::model::card::Extreme;
    use crate::model::player::Seat;

    /// Declares the first legal value and plays its first card.
    struct FirstLegal;

    impl Participant for FirstLegal {
        fn request_declaration(&mut self, ctx: &DeclarationContext<'_>) -> u8 {
            ctx.legal_values().first().copied().unwrap_or(0)
        }

        fn request_play(&mut self, ctx: &PlayContext<'_>) -> PlayChoice {
            let card = ctx.hand.cards()[0];
            if card.is_ace_of_hearts() {
                PlayChoice::ace_of_hearts(Extreme::Low)
            } else {
                PlayChoice::card(card)
            }
        }
    }

    /// Always asks for more tricks than exist.
    struct Greedy;

    impl Participant for Greedy {
        fn request_declaration(&mut self, ctx: &DeclarationContext<'_>) -> u8 {
            ctx.cards_per_hand + 1
        }

        fn request_play(&mut self, _ctx: &PlayContext<'_>) -> PlayChoice {
            unreachable!("declarations never close")
        }
    }

    fn first_legal_table(players: usize) -> Vec<Box<dyn Participant>> {
        (0..players)
            .map(|_| Box::new(FirstLegal) as Box<dyn Participant>)
            .collect()
    }

    #[test]
    fn participant_count_must_match_the_table() {
        let state = start_game(["a", "b", "c"], GameConfig::with_seed(1)).unwrap();
        assert!(matches!(
            GameController::new(state, first_legal_table(2)),
            Err(EngineError::InvalidRoster { count: 2, .. })
        ));
    }

    #[test]
    fn run_reaches_a_terminal_result() {
        let state = start_game(["a", "b", "c", "d"], GameConfig::with_seed(11)).unwrap();
        let mut controller = GameController::new(state, first_legal_table(4)).unwrap();
        let outcome = controller.run().unwrap();

        assert!(!outcome.rounds.is_empty());
        assert!(outcome.rounds.len() <= 9);
        assert_eq!(outcome.result.rounds_played as usize, outcome.rounds.len());
        match outcome.result.reason {
            TerminationReason::LastSurvivor => assert!(outcome.result.winner.is_some()),
            TerminationReason::AllEliminated | TerminationReason::PlanExhausted => {
                assert!(outcome.result.winner.is_none())
            }
        }
        assert!(controller.state().is_over());
    }

    #[test]
    fn repeated_illegal_input_stalls_the_game() {
        let state = start_game(["a", "b"], GameConfig::with_seed(5)).unwrap();
        let participants: Vec<Box<dyn Participant>> = vec![
            Box::new(Greedy),
            Box::new(ScriptedParticipant::default()),
        ];
        let mut controller = GameController::new(state, participants).unwrap();
        assert_eq!(
            controller.run(),
            Err(EngineError::ParticipantStalled {
                seat: Seat::new(0),
                attempts: MAX_INPUT_ATTEMPTS
            })
        );
    }
}
