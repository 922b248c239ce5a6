//! Graph-based rating system
//!
//! This module provides the player graph store, the margin-aware update
//! rule, and the engine that ties them together with propagation and
//! unplayed-match estimation.

pub mod calculator;
pub mod engine;
pub mod graph;

// Re-export commonly used types
pub use calculator::{expected_score, RatingCalculation};
pub use engine::{EngineStats, MatchOutcome, RatingEngine, UnplayedEstimate};
pub use graph::{GraphStore, InMemoryGraphStore, RATING_FLOOR};
