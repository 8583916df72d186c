#![deny(warnings)]
pub mod error;
pub mod game;
pub mod model;

pub use error::{DeclarationRejection, EngineError, PlayRejection};
pub use game::controller::{GameController, MAX_INPUT_ATTEMPTS};
pub use game::events::{GameOutcome, GameResult, RoundResult, TerminationReason};
pub use game::participant::{DeclarationContext, Participant, PlayChoice, PlayContext};
pub use game::state::{Advance, GameConfig, GameState, start_game};

pub struct EngineInfo;

impl EngineInfo {
    pub const fn name() -> &'static str {
        "mascarpone"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
