//! Rating engine
//!
//! Owns the player graph and implements the two operations exposed to
//! callers: recording a completed match and estimating a matchup that has
//! never been played. The whole update sequence runs under one write lock,
//! estimation under the read lock.

use crate::error::RatingError;
use crate::rating::calculator::{self, RatingCalculation};
use crate::rating::graph::{GraphStore, InMemoryGraphStore};
use crate::types::{MatchResult, PlayerId, PlayerNode, PlayerSummary, RatingUpdate};
use crate::utils::{mean, round2};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// Everything a single `record_match` call did to the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Rounded ratings returned to the caller
    pub update: RatingUpdate,
    pub calculation: RatingCalculation,
    /// Players whose rating was reduced by propagation
    pub propagated_to: Vec<PlayerId>,
}

/// Result of an unplayed-matchup estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnplayedEstimate {
    /// Estimated rating difference (player1 minus player2), rounded to 2 decimals
    pub estimated_rating_diff: f64,
    /// Players recorded as having beaten both participants
    pub mutual_opponents: Vec<PlayerId>,
}

/// Engine statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub players: usize,
    pub match_edges: usize,
    pub matches_recorded: u64,
}

/// Graph-backed rating engine
#[derive(Debug)]
pub struct RatingEngine<S: GraphStore = InMemoryGraphStore> {
    store: RwLock<S>,
    matches_recorded: AtomicU64,
}

impl RatingEngine<InMemoryGraphStore> {
    /// Create an engine over an empty in-memory graph
    pub fn new() -> Self {
        Self::with_store(InMemoryGraphStore::new())
    }
}

impl Default for RatingEngine<InMemoryGraphStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphStore> RatingEngine<S> {
    /// Create an engine over an existing store
    pub fn with_store(store: S) -> Self {
        Self {
            store: RwLock::new(store),
            matches_recorded: AtomicU64::new(0),
        }
    }

    fn read_store(&self) -> crate::error::Result<RwLockReadGuard<'_, S>> {
        self.store.read().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire graph read lock".to_string(),
            }
            .into()
        })
    }

    fn write_store(&self) -> crate::error::Result<RwLockWriteGuard<'_, S>> {
        self.store.write().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire graph write lock".to_string(),
            }
            .into()
        })
    }

    /// Apply a completed match to the graph and return the new ratings.
    ///
    /// Both players are created with the ratings reported in `result` if
    /// they are new. Players previously recorded as having beaten the loser
    /// lose a dampened share of the rating change.
    pub fn record_match(&self, result: &MatchResult) -> crate::error::Result<MatchOutcome> {
        result.validate()?;

        let calculation = calculator::calculate(
            result.winner_rating,
            result.loser_rating,
            result.score_diff,
        );

        let mut store = self.write_store()?;

        store.ensure_node(&result.winner, result.winner_rating);
        store.ensure_node(&result.loser, result.loser_rating);
        store.set_rating(&result.winner, calculation.winner_new)?;
        store.set_rating(&result.loser, calculation.loser_new)?;

        // Snapshot before the new edge lands
        let previous_winners = store.predecessors(&result.loser);
        store.upsert_edge(&result.winner, &result.loser, calculation.rating_change);

        let penalty = calculation.propagated_change();
        let mut propagated_to = Vec::with_capacity(previous_winners.len());
        for player_id in previous_winners {
            let current = match store.get_rating(&player_id) {
                Ok(rating) => rating,
                Err(e) => {
                    warn!(
                        "Skipping propagation to '{}' after loss by '{}': {}",
                        player_id, result.loser, e
                    );
                    continue;
                }
            };

            store.set_rating(&player_id, current - penalty)?;
            propagated_to.push(player_id);
        }

        drop(store);
        self.matches_recorded.fetch_add(1, Ordering::Relaxed);

        debug!(
            "Recorded match {} def. {} (diff {}): change {:.4}, propagated to {} players",
            result.winner,
            result.loser,
            result.score_diff,
            calculation.rating_change,
            propagated_to.len()
        );

        Ok(MatchOutcome {
            update: RatingUpdate {
                winner_new_rating: round2(calculation.winner_new),
                loser_new_rating: round2(calculation.loser_new),
            },
            calculation,
            propagated_to,
        })
    }

    /// Estimate the rating difference between two players who may never have met.
    ///
    /// Fails with `PlayerNotFound` if either player is unknown.
    pub fn estimate_unplayed(
        &self,
        player1: &str,
        player2: &str,
    ) -> crate::error::Result<UnplayedEstimate> {
        let store = self.read_store()?;

        for player_id in [player1, player2] {
            if !store.contains(player_id) {
                return Err(RatingError::PlayerNotFound {
                    player_id: player_id.to_string(),
                }
                .into());
            }
        }

        let rating1 = store.get_rating(player1)?;
        let rating2 = store.get_rating(player2)?;
        let direct_diff = rating1 - rating2;

        let beaten_player2 = store.predecessors(player2);
        let mutual_opponents: Vec<PlayerId> = store
            .predecessors(player1)
            .intersection(&beaten_player2)
            .cloned()
            .collect();

        let opponent_ratings: Vec<f64> = mutual_opponents
            .iter()
            .filter_map(|id| store.get_rating(id).ok())
            .collect();

        let estimated = match mean(&opponent_ratings) {
            Some(avg_opponent_rating) => (direct_diff + avg_opponent_rating) / 2.0,
            None => direct_diff / 2.0,
        };

        Ok(UnplayedEstimate {
            estimated_rating_diff: round2(estimated),
            mutual_opponents,
        })
    }

    /// Probability that a player rated `rating1` beats one rated `rating2`
    pub fn win_probability(&self, rating1: f64, rating2: f64) -> f64 {
        calculator::expected_score(rating1, rating2)
    }

    /// Current unrounded rating of a player
    pub fn rating(&self, player_id: &str) -> crate::error::Result<f64> {
        self.read_store()?.get_rating(player_id)
    }

    /// Node record for a player, if known
    pub fn player(&self, player_id: &str) -> crate::error::Result<Option<PlayerNode>> {
        Ok(self.read_store()?.node(player_id))
    }

    /// Presentation view of a player, if known
    pub fn player_summary(&self, player_id: &str) -> crate::error::Result<Option<PlayerSummary>> {
        let store = self.read_store()?;
        Ok(store.node(player_id).map(|node| PlayerSummary {
            beaten_by: store.predecessors(player_id).into_iter().collect(),
            id: node.id,
            rating: round2(node.rating),
            created_at: node.created_at,
            last_updated: node.last_updated,
        }))
    }

    /// Weight of the most recent `winner -> loser` result, if any
    pub fn edge_weight(&self, winner: &str, loser: &str) -> crate::error::Result<Option<f64>> {
        Ok(self.read_store()?.edge_weight(winner, loser))
    }

    /// Get engine statistics
    pub fn stats(&self) -> crate::error::Result<EngineStats> {
        let store = self.read_store()?;
        Ok(EngineStats {
            players: store.node_count(),
            match_edges: store.edge_count(),
            matches_recorded: self.matches_recorded.load(Ordering::Relaxed),
        })
    }

    /// Run a closure against the store under the read lock
    pub fn inspect<T>(&self, f: impl FnOnce(&S) -> T) -> crate::error::Result<T> {
        let store = self.read_store()?;
        Ok(f(&store))
    }
}
