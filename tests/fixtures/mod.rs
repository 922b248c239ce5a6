//! Test fixtures and helpers shared by integration tests

#![allow(dead_code)]

use std::sync::Arc;
use tennis_rating::config::AppConfig;
use tennis_rating::rating::{GraphStore, InMemoryGraphStore, RatingEngine};
use tennis_rating::service::AppState;
use tennis_rating::types::MatchResult;

pub const EPSILON: f64 = 1e-9;

/// Assert two floats are equal within `EPSILON`
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {expected}, got {actual}"
    );
}

/// Build an engine over a pre-seeded graph
pub fn seeded_engine(players: &[(&str, f64)], edges: &[(&str, &str, f64)]) -> RatingEngine {
    let mut store = InMemoryGraphStore::new();
    for (id, rating) in players {
        store.ensure_node(id, *rating);
    }
    for (winner, loser, weight) in edges {
        store.upsert_edge(winner, loser, *weight);
    }
    RatingEngine::with_store(store)
}

/// Shorthand for a match result
pub fn match_result(
    winner: &str,
    loser: &str,
    winner_rating: f64,
    loser_rating: f64,
    score_diff: i64,
) -> MatchResult {
    MatchResult::new(winner, loser, winner_rating, loser_rating, score_diff)
}

/// Application state around a fresh engine
pub fn test_app_state() -> Arc<AppState> {
    Arc::new(AppState::new(AppConfig::default()).expect("valid default config"))
}

/// Every stored rating, ordered by player id
pub fn all_ratings(engine: &RatingEngine) -> Vec<(String, f64)> {
    engine
        .inspect(|store| {
            store
                .players()
                .map(|node| (node.id.clone(), node.rating))
                .collect()
        })
        .expect("graph lock")
}
