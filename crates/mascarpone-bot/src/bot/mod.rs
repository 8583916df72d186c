mod declare;
mod play;

pub use declare::DeclarePlanner;
pub use play::{PlayPlanner, TrickIntent};

use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotDifficulty {
    /// First legal declaration, first card in hand.
    Easy,
    #[default]
    Normal,
}

impl BotDifficulty {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" | "naive" => Some(BotDifficulty::Easy),
            "normal" | "default" | "heuristic" => Some(BotDifficulty::Normal),
            _ => None,
        }
    }

    pub fn from_env() -> Self {
        static CACHED: OnceLock<BotDifficulty> = OnceLock::new();
        *CACHED.get_or_init(|| {
            std::env::var("MASCARPONE_BOT_DIFFICULTY")
                .ok()
                .and_then(|raw| Self::parse(&raw))
                .unwrap_or_default()
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BotDifficulty::Easy => "easy",
            BotDifficulty::Normal => "normal",
        }
    }
}
