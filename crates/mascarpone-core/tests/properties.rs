//! Whole-game properties over seeded random tables.
//!
//! - Card strengths form a strict total order over all 53 playable cards
//! - The declared total never equals the round's card count
//! - Rounds never overdraw the deck and the game ends within the schedule
//! - Exactly the players whose tricks differ from their declaration are eliminated
//! - Hands lose one card per trick and run out on the last one
//! - Every round eliminates someone, so the schedule never runs dry with a table left
//! - A recorded game replays to the identical outcome

use mascarpone_core::game::plan::RoundPlan;
use mascarpone_core::game::serialization::{GameRecord, GameSnapshot};
use mascarpone_core::model::card::{Card, Extreme, PlayedCard};
use mascarpone_core::model::rank::Rank;
use mascarpone_core::model::round::PlayOutcome;
use mascarpone_core::model::suit::Suit;
use mascarpone_core::{
    Advance, DeclarationContext, GameConfig, GameController, GameOutcome, Participant, PlayChoice,
    PlayContext, TerminationReason, start_game,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Picks uniformly among legal declarations and held cards.
struct RandomParticipant {
    rng: StdRng,
}

impl Participant for RandomParticipant {
    fn request_declaration(&mut self, ctx: &DeclarationContext<'_>) -> u8 {
        ctx.legal_values()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(0)
    }

    fn request_play(&mut self, ctx: &PlayContext<'_>) -> PlayChoice {
        let card = ctx.hand.cards()[self.rng.gen_range(0..ctx.hand.len())];
        if card.is_ace_of_hearts() {
            let extreme = if self.rng.gen_bool(0.5) {
                Extreme::High
            } else {
                Extreme::Low
            };
            PlayChoice::ace_of_hearts(extreme)
        } else {
            PlayChoice::card(card)
        }
    }
}

fn play_random_game(players: usize, seed: u64) -> (GameSnapshot, GameOutcome) {
    let roster = (0..players).map(|i| format!("p{i}"));
    let state = start_game(roster, GameConfig::with_seed(seed)).unwrap();
    let snapshot = GameSnapshot::capture(&state);
    let participants = (0..players)
        .map(|i| {
            Box::new(RandomParticipant {
                rng: StdRng::seed_from_u64(seed ^ (i as u64 + 1)),
            }) as Box<dyn Participant>
        })
        .collect();
    let outcome = GameController::new(state, participants)
        .unwrap()
        .run()
        .unwrap();
    (snapshot, outcome)
}

fn all_played_cards() -> Vec<PlayedCard> {
    let mut cards = Vec::new();
    for suit in Suit::ALL {
        for rank in Rank::ORDERED {
            let card = Card::new(rank, suit);
            if card.is_ace_of_hearts() {
                cards.push(PlayedCard::ace_of_hearts(Extreme::Low));
                cards.push(PlayedCard::ace_of_hearts(Extreme::High));
            } else {
                cards.push(PlayedCard::new(card, None).unwrap());
            }
        }
    }
    cards
}

#[test]
fn strengths_are_distinct_and_span_the_full_range() {
    let cards = all_played_cards();
    let strengths: HashSet<u8> = cards.iter().map(|card| card.strength()).collect();
    assert_eq!(cards.len(), 53);
    assert_eq!(strengths.len(), 53);
    assert_eq!(strengths.iter().min(), Some(&0));
    assert_eq!(strengths.iter().max(), Some(&53));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn comparison_is_antisymmetric(a in 0usize..53, b in 0usize..53) {
        let cards = all_played_cards();
        let (x, y) = (cards[a], cards[b]);
        if a == b {
            prop_assert!(x.compare(&y).is_err());
        } else {
            let forward = x.compare(&y).unwrap();
            let backward = y.compare(&x).unwrap();
            prop_assert_ne!(forward, Ordering::Equal);
            prop_assert_eq!(forward, backward.reverse());
        }
    }

    #[test]
    fn declared_total_never_matches_the_card_count(players in 2usize..=10, seed in any::<u64>()) {
        let (_, outcome) = play_random_game(players, seed);
        for round in &outcome.rounds {
            prop_assert_ne!(round.declared_total(), u32::from(round.cards_per_hand));
            prop_assert!(round.declarations.iter().all(|d| d.value <= round.cards_per_hand));
        }
    }

    #[test]
    fn rounds_fit_the_deck_and_the_schedule(players in 2usize..=10, seed in any::<u64>()) {
        let (_, outcome) = play_random_game(players, seed);
        prop_assert!(outcome.rounds.len() <= RoundPlan::schedule().len());
        for round in &outcome.rounds {
            prop_assert!(round.players.len() * usize::from(round.cards_per_hand) <= 52);
            prop_assert!(round.cards_per_hand > 0);
        }
        let last_active = outcome
            .rounds
            .last()
            .map_or(players, |round| round.survivors().count());
        match outcome.result.reason {
            TerminationReason::LastSurvivor => prop_assert_eq!(last_active, 1),
            TerminationReason::AllEliminated => prop_assert_eq!(last_active, 0),
            TerminationReason::PlanExhausted => prop_assert!(last_active >= 2),
        }
    }

    #[test]
    fn elimination_is_exact(players in 2usize..=10, seed in any::<u64>()) {
        let (_, outcome) = play_random_game(players, seed);
        let mut seated: HashSet<String> = (0..players).map(|i| format!("p{i}")).collect();
        for round in &outcome.rounds {
            prop_assert_eq!(round.tricks.len(), usize::from(round.cards_per_hand));
            for trick in &round.tricks {
                prop_assert_eq!(trick.plays.len(), round.players.len());
            }
            let won: u32 = round.players.iter().map(|p| u32::from(p.won)).sum();
            prop_assert_eq!(won, u32::from(round.cards_per_hand));
            for player in &round.players {
                prop_assert!(seated.contains(player.player.as_str()));
                prop_assert_eq!(player.eliminated, player.declared != player.won);
            }
            for id in round.eliminated() {
                seated.remove(id.as_str());
            }
        }
        let remaining: HashSet<String> = outcome
            .result
            .remaining
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();
        prop_assert_eq!(remaining, seated);
    }

    #[test]
    fn hands_shrink_by_one_card_per_trick(players in 2usize..=10, seed in any::<u64>()) {
        let roster = (0..players).map(|i| format!("p{i}"));
        let mut state = start_game(roster, GameConfig::with_seed(seed)).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);

        while let Advance::Started { .. } = state.begin_round().unwrap() {
            while let Some(seat) = state.round().and_then(|round| round.declaring_seat()) {
                let legal = state.round().unwrap().declarations().legal_for(seat);
                let value = *legal.choose(&mut rng).unwrap();
                state.declare(seat, value).unwrap();
            }

            while let Some(seat) = state.round().and_then(|round| round.current_player()) {
                let hand = state.round().unwrap().hand(seat).unwrap();
                let card = hand.cards()[rng.gen_range(0..hand.len())];
                let extreme = card.is_ace_of_hearts().then_some(Extreme::High);
                let outcome = state.play_card(seat, card, extreme).unwrap();
                if outcome == PlayOutcome::Played {
                    continue;
                }

                let round = state.round().unwrap();
                let expected = usize::from(round.cards_per_hand()) - round.tricks_completed();
                prop_assert_eq!(
                    expected == 0,
                    matches!(outcome, PlayOutcome::RoundCompleted { .. })
                );
                for &active in round.rotation() {
                    prop_assert_eq!(round.hand(active).unwrap().len(), expected);
                }
                let last = round.trick_history().last().unwrap();
                prop_assert_eq!(last.trick.plays().len(), round.rotation().len());
                prop_assert!(last.trick.plays().iter().any(|play| play.seat == last.winner));
            }

            let result = state.finish_round().unwrap();
            prop_assert!(result.eliminated().count() >= 1);
        }
        prop_assert_ne!(state.result().unwrap().reason, TerminationReason::PlanExhausted);
    }

    #[test]
    fn recorded_games_replay_identically(players in 2usize..=6, seed in any::<u64>()) {
        let (snapshot, outcome) = play_random_game(players, seed);
        let record = GameRecord::new(snapshot, outcome);
        prop_assert!(record.verify().unwrap());
    }
}
