use super::BotDifficulty;
use mascarpone_core::model::card::{Extreme, PlayedCard};
use mascarpone_core::{PlayChoice, PlayContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrickIntent {
    /// Still short of the declaration.
    Chase,
    /// Declaration met (or overshot); avoid taking more.
    Duck,
}

impl TrickIntent {
    pub fn for_context(ctx: &PlayContext<'_>) -> Self {
        if ctx.tricks_needed() > 0 {
            TrickIntent::Chase
        } else {
            TrickIntent::Duck
        }
    }
}

pub struct PlayPlanner;

impl PlayPlanner {
    pub fn choose(ctx: &PlayContext<'_>, difficulty: BotDifficulty) -> Option<PlayChoice> {
        let options = candidates(ctx);
        if difficulty == BotDifficulty::Easy {
            return options.first().map(|played| to_choice(*played));
        }

        let top = ctx
            .trick
            .plays()
            .iter()
            .map(|play| play.played.strength())
            .max();
        let weakest = options.iter().min_by_key(|played| played.strength());
        let chosen = match (TrickIntent::for_context(ctx), top) {
            (TrickIntent::Chase, None) => options.iter().max_by_key(|played| played.strength()),
            (TrickIntent::Chase, Some(top)) => options
                .iter()
                .filter(|played| played.strength() > top)
                .min_by_key(|played| played.strength())
                .or(weakest),
            (TrickIntent::Duck, None) => weakest,
            (TrickIntent::Duck, Some(top)) => options
                .iter()
                .filter(|played| played.strength() < top)
                .max_by_key(|played| played.strength())
                .or(weakest),
        };
        chosen.map(|played| to_choice(*played))
    }
}

/// Every way the hand can be played; the Ace of Hearts appears once per extreme,
/// low first.
fn candidates(ctx: &PlayContext<'_>) -> Vec<PlayedCard> {
    ctx.hand
        .iter()
        .flat_map(|&card| {
            if card.is_ace_of_hearts() {
                vec![
                    PlayedCard::ace_of_hearts(Extreme::Low),
                    PlayedCard::ace_of_hearts(Extreme::High),
                ]
            } else {
                PlayedCard::new(card, None).into_iter().collect()
            }
        })
        .collect()
}

fn to_choice(played: PlayedCard) -> PlayChoice {
    PlayChoice {
        card: played.card(),
        extreme: played.extreme(),
    }
}
