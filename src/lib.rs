//! Tennis Rating - rating service for tennis players
//!
//! This crate keeps player ratings in a directed graph of match results,
//! propagates dampened corrections to players who previously beat a loser,
//! and estimates unplayed matchups from mutual-opponent evidence. An Axum
//! HTTP layer exposes the engine.

pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use rating::{GraphStore, InMemoryGraphStore, RatingEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
