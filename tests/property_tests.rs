//! Property-based tests for the rating engine
//!
//! Random match sequences are applied to a fresh engine and the graph is
//! checked for the guarantees callers rely on.

mod fixtures;

use proptest::prelude::*;
use tennis_rating::rating::calculator::{calculate, expected_score};
use tennis_rating::rating::{RatingEngine, RATING_FLOOR};
use tennis_rating::types::MatchResult;

use fixtures::all_ratings;

const PLAYERS: [&str; 6] = ["ana", "ben", "cai", "dee", "eli", "fay"];

/// A submitted match between two distinct players from a small pool
fn arb_match() -> impl Strategy<Value = MatchResult> {
    (
        0..PLAYERS.len(),
        1..PLAYERS.len(),
        3.0f64..60.0,
        3.0f64..60.0,
        0i64..13,
    )
        .prop_map(|(winner, offset, winner_rating, loser_rating, diff)| {
            let loser = (winner + offset) % PLAYERS.len();
            MatchResult::new(
                PLAYERS[winner],
                PLAYERS[loser],
                winner_rating,
                loser_rating,
                diff,
            )
        })
}

fn replay(matches: &[MatchResult]) -> RatingEngine {
    let engine = RatingEngine::new();
    for result in matches {
        engine.record_match(result).unwrap();
    }
    engine
}

proptest! {
    #[test]
    fn prop_ratings_never_below_floor(matches in prop::collection::vec(arb_match(), 1..60)) {
        let engine = replay(&matches);
        for (id, rating) in all_ratings(&engine) {
            prop_assert!(rating >= RATING_FLOOR, "{} fell to {}", id, rating);
        }
    }

    #[test]
    fn prop_winner_gains_loser_drops(
        winner_rating in 3.0f64..80.0,
        loser_rating in 3.0f64..80.0,
        diff in 0i64..20,
    ) {
        let calc = calculate(winner_rating, loser_rating, diff);
        prop_assert!(calc.rating_change > 0.0);
        prop_assert!(calc.winner_new > winner_rating);
        prop_assert!(calc.loser_new <= loser_rating);
        prop_assert!(calc.loser_new >= RATING_FLOOR);
    }

    #[test]
    fn prop_larger_margin_moves_more(
        winner_rating in 3.0f64..80.0,
        loser_rating in 3.0f64..80.0,
        diff in 0i64..20,
    ) {
        let narrow = calculate(winner_rating, loser_rating, diff);
        let wide = calculate(winner_rating, loser_rating, diff + 1);
        prop_assert!(wide.rating_change > narrow.rating_change);
    }

    #[test]
    fn prop_expected_scores_sum_to_one(a in -100.0f64..100.0, b in -100.0f64..100.0) {
        let total = expected_score(a, b) + expected_score(b, a);
        prop_assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn prop_replay_is_deterministic(matches in prop::collection::vec(arb_match(), 1..40)) {
        let first = replay(&matches);
        let second = replay(&matches);
        prop_assert_eq!(all_ratings(&first), all_ratings(&second));
        prop_assert_eq!(first.stats().unwrap(), second.stats().unwrap());
    }

    #[test]
    fn prop_estimation_is_read_only(
        matches in prop::collection::vec(arb_match(), 1..40),
        a in 0..PLAYERS.len(),
        b in 0..PLAYERS.len(),
    ) {
        let engine = replay(&matches);
        let before = all_ratings(&engine);
        let stats_before = engine.stats().unwrap();

        let _ = engine.estimate_unplayed(PLAYERS[a], PLAYERS[b]);

        prop_assert_eq!(all_ratings(&engine), before);
        prop_assert_eq!(engine.stats().unwrap(), stats_before);
    }

    #[test]
    fn prop_one_edge_per_ordered_pair(matches in prop::collection::vec(arb_match(), 1..60)) {
        let engine = replay(&matches);
        let mut pairs: Vec<(&str, &str)> = matches
            .iter()
            .map(|m| (m.winner.as_str(), m.loser.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs.dedup();

        let stats = engine.stats().unwrap();
        prop_assert_eq!(stats.match_edges, pairs.len());
        prop_assert_eq!(stats.matches_recorded, matches.len() as u64);

        // The stored weight belongs to the latest result for each pair
        for (winner, loser) in pairs {
            let latest = matches
                .iter()
                .rev()
                .find(|m| m.winner == winner && m.loser == loser)
                .unwrap();
            let expected = calculate(latest.winner_rating, latest.loser_rating, latest.score_diff)
                .rating_change;
            prop_assert_eq!(engine.edge_weight(winner, loser).unwrap(), Some(expected));
        }
    }
}
