use super::BotDifficulty;
use mascarpone_core::DeclarationContext;

pub struct DeclarePlanner;

impl DeclarePlanner {
    pub fn choose(ctx: &DeclarationContext<'_>, difficulty: BotDifficulty) -> u8 {
        let legal = ctx.legal_values();
        match difficulty {
            BotDifficulty::Easy => legal.first().copied().unwrap_or(0),
            BotDifficulty::Normal => {
                let target = Self::estimate(ctx);
                nearest(&legal, target).unwrap_or(target)
            }
        }
    }

    /// Every heart is counted as a likely trick.
    pub fn estimate(ctx: &DeclarationContext<'_>) -> u8 {
        let hearts = ctx.hand.count_hearts().min(usize::from(ctx.cards_per_hand));
        hearts as u8
    }
}

/// Closest legal value to `target`, preferring the lower one on ties.
fn nearest(legal: &[u8], target: u8) -> Option<u8> {
    legal
        .iter()
        .copied()
        .min_by_key(|&value| (value.abs_diff(target), value))
}
