use crate::bot::{BotDifficulty, DeclarePlanner, PlayPlanner, TrickIntent};
use mascarpone_core::model::card::Extreme;
use mascarpone_core::{DeclarationContext, EngineError, Participant, PlayChoice, PlayContext};
use tracing::{Level, event};

/// Seats a planner-driven bot at the table.
#[derive(Debug, Clone)]
pub struct HeuristicParticipant {
    difficulty: BotDifficulty,
    rejections: u32,
}

impl HeuristicParticipant {
    pub fn new(difficulty: BotDifficulty) -> Self {
        Self {
            difficulty,
            rejections: 0,
        }
    }

    pub fn easy() -> Self {
        Self::new(BotDifficulty::Easy)
    }

    pub fn normal() -> Self {
        Self::new(BotDifficulty::Normal)
    }

    pub fn difficulty(&self) -> BotDifficulty {
        self.difficulty
    }

    /// Inputs the engine refused so far; stays at zero unless a planner is wrong.
    pub fn rejections(&self) -> u32 {
        self.rejections
    }
}

impl Default for HeuristicParticipant {
    fn default() -> Self {
        Self::new(BotDifficulty::from_env())
    }
}

impl Participant for HeuristicParticipant {
    fn request_declaration(&mut self, ctx: &DeclarationContext<'_>) -> u8 {
        let value = DeclarePlanner::choose(ctx, self.difficulty);
        log_declaration(ctx, self.difficulty, value);
        value
    }

    fn request_play(&mut self, ctx: &PlayContext<'_>) -> PlayChoice {
        let choice = PlayPlanner::choose(ctx, self.difficulty)
            .unwrap_or(PlayChoice::ace_of_hearts(Extreme::Low));
        log_play(ctx, self.difficulty, choice);
        choice
    }

    fn on_rejected(&mut self, error: &EngineError) {
        self.rejections += 1;
        event!(
            target: "mascarpone_bot::play",
            Level::WARN,
            difficulty = self.difficulty.as_str(),
            error = %error,
            "bot input rejected"
        );
    }
}

fn log_declaration(ctx: &DeclarationContext<'_>, difficulty: BotDifficulty, value: u8) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }

    let forbidden = ctx
        .forbidden
        .map_or_else(|| "-".to_string(), |value| value.to_string());
    event!(
        target: "mascarpone_bot::declare",
        Level::DEBUG,
        player = %ctx.player,
        round = ctx.round_index,
        difficulty = difficulty.as_str(),
        hand_size = ctx.hand.len(),
        hearts = ctx.hand.count_hearts(),
        declared_so_far = ctx.declared_so_far(),
        is_dealer = ctx.is_dealer,
        forbidden = %forbidden,
        value,
    );
}

fn log_play(ctx: &PlayContext<'_>, difficulty: BotDifficulty, choice: PlayChoice) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }

    let chosen = match choice.extreme {
        Some(Extreme::High) => format!("{}+", choice.card),
        Some(Extreme::Low) => format!("{}-", choice.card),
        None => choice.card.to_string(),
    };
    let hand_preview = if ctx.hand.len() <= 7 {
        ctx.hand
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    } else {
        format!("{} cards", ctx.hand.len())
    };

    event!(
        target: "mascarpone_bot::play",
        Level::DEBUG,
        player = %ctx.player,
        round = ctx.round_index,
        difficulty = difficulty.as_str(),
        intent = ?TrickIntent::for_context(ctx),
        declared = ctx.declared,
        won = ctx.won,
        hand = %hand_preview,
        trick_cards = ctx.trick.plays().len(),
        chosen = %chosen,
    );
}

#[cfg(test)]
mod tests {
    use super::HeuristicParticipant;
    use crate::bot::BotDifficulty;
    use mascarpone_core::{GameConfig, GameController, Participant, start_game};

    fn bots(difficulty: BotDifficulty, count: usize) -> Vec<Box<dyn Participant>> {
        (0..count)
            .map(|_| Box::new(HeuristicParticipant::new(difficulty)) as Box<dyn Participant>)
            .collect()
    }

    #[test]
    fn normal_bots_finish_a_full_table() {
        let state = start_game(
            (0..10).map(|i| format!("bot{i}")),
            GameConfig::with_seed(2024),
        )
        .unwrap();
        let outcome = GameController::new(state, bots(BotDifficulty::Normal, 10))
            .unwrap()
            .run()
            .unwrap();
        assert!(!outcome.rounds.is_empty());
        assert!(outcome.rounds[0].players.len() == 10);
        assert!(
            outcome
                .rounds
                .iter()
                .all(|round| round.players.len() * usize::from(round.cards_per_hand) <= 52)
        );
    }

    #[test]
    fn easy_bots_never_trip_the_validator() {
        let state = start_game(["a", "b", "c"], GameConfig::with_seed(9)).unwrap();
        let outcome = GameController::new(state, bots(BotDifficulty::Easy, 3))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(
            outcome.result.rounds_played as usize,
            outcome.rounds.len()
        );
    }
}
