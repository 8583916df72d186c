pub mod bot;
pub mod policy;

pub use bot::{BotDifficulty, DeclarePlanner, PlayPlanner, TrickIntent};
pub use policy::HeuristicParticipant;
