//! Player graph storage
//!
//! Players are nodes, match results are directed edges from winner to loser
//! weighted by the rating change of that match. Only the most recent result
//! per ordered pair is kept. Every rating written through the store is
//! clamped to [`RATING_FLOOR`].

use crate::error::RatingError;
use crate::types::{PlayerId, PlayerNode};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};

/// Lowest rating any player can hold
pub const RATING_FLOOR: f64 = 3.0;

/// Apply the rating floor
pub fn floor_rating(value: f64) -> f64 {
    value.max(RATING_FLOOR)
}

/// Trait for player graph operations
pub trait GraphStore: Send + Sync {
    /// Create the node with `initial_rating` (floored) if absent; no-op if present
    fn ensure_node(&mut self, player_id: &str, initial_rating: f64);

    /// Set a node's rating to `max(RATING_FLOOR, value)`
    fn set_rating(&mut self, player_id: &str, value: f64) -> crate::error::Result<()>;

    /// Get a node's current rating
    fn get_rating(&self, player_id: &str) -> crate::error::Result<f64>;

    /// Create the directed edge or overwrite its weight. Does not create nodes.
    fn upsert_edge(&mut self, from: &str, to: &str, weight: f64);

    /// Players with an edge into `player_id`; empty for unknown players
    fn predecessors(&self, player_id: &str) -> BTreeSet<PlayerId>;

    /// Check whether a node exists
    fn contains(&self, player_id: &str) -> bool;

    /// Get the full node record
    fn node(&self, player_id: &str) -> Option<PlayerNode>;

    /// Weight of the edge `from -> to`, if recorded
    fn edge_weight(&self, from: &str, to: &str) -> Option<f64>;

    /// Total number of players
    fn node_count(&self) -> usize;

    /// Total number of recorded match edges
    fn edge_count(&self) -> usize;
}

/// In-memory graph store.
///
/// Uses `BTreeMap`/`BTreeSet` so predecessor iteration order is stable.
/// Not synchronized: the engine wraps it in a single lock.
#[derive(Debug, Default, Clone)]
pub struct InMemoryGraphStore {
    nodes: BTreeMap<PlayerId, PlayerNode>,
    /// winner -> (loser -> weight)
    edges: BTreeMap<PlayerId, BTreeMap<PlayerId, f64>>,
    /// loser -> winners; reverse index of `edges`
    incoming: BTreeMap<PlayerId, BTreeSet<PlayerId>>,
    edge_count: usize,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All players, ordered by id
    pub fn players(&self) -> impl Iterator<Item = &PlayerNode> {
        self.nodes.values()
    }
}

impl GraphStore for InMemoryGraphStore {
    fn ensure_node(&mut self, player_id: &str, initial_rating: f64) {
        if self.nodes.contains_key(player_id) {
            return;
        }

        let now = Utc::now();
        self.nodes.insert(
            player_id.to_string(),
            PlayerNode {
                id: player_id.to_string(),
                rating: floor_rating(initial_rating),
                created_at: now,
                last_updated: now,
            },
        );
    }

    fn set_rating(&mut self, player_id: &str, value: f64) -> crate::error::Result<()> {
        let node = self
            .nodes
            .get_mut(player_id)
            .ok_or_else(|| RatingError::NodeNotFound {
                player_id: player_id.to_string(),
            })?;

        node.rating = floor_rating(value);
        node.last_updated = Utc::now();
        Ok(())
    }

    fn get_rating(&self, player_id: &str) -> crate::error::Result<f64> {
        self.nodes
            .get(player_id)
            .map(|node| node.rating)
            .ok_or_else(|| {
                RatingError::NodeNotFound {
                    player_id: player_id.to_string(),
                }
                .into()
            })
    }

    fn upsert_edge(&mut self, from: &str, to: &str, weight: f64) {
        let previous = self
            .edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), weight);

        if previous.is_none() {
            self.edge_count += 1;
            self.incoming
                .entry(to.to_string())
                .or_default()
                .insert(from.to_string());
        }
    }

    fn predecessors(&self, player_id: &str) -> BTreeSet<PlayerId> {
        self.incoming.get(player_id).cloned().unwrap_or_default()
    }

    fn contains(&self, player_id: &str) -> bool {
        self.nodes.contains_key(player_id)
    }

    fn node(&self, player_id: &str) -> Option<PlayerNode> {
        self.nodes.get(player_id).cloned()
    }

    fn edge_weight(&self, from: &str, to: &str) -> Option<f64> {
        self.edges.get(from).and_then(|out| out.get(to)).copied()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edge_count
    }
}
