//! Margin-aware rating update rule
//!
//! Pure functions with no store access. The engine feeds them the ratings
//! reported with a match and applies the result to the graph.

use crate::rating::graph::floor_rating;
use serde::{Deserialize, Serialize};

/// Base sensitivity of every update
pub const K_FACTOR: f64 = 5.0;

/// Rating gap that shifts win odds by a factor of ten
pub const SCALE_DIVISOR: f64 = 50.0;

/// Score differential that adds one full K to the update
pub const MARGIN_DIVISOR: f64 = 6.0;

/// Share of a rating change passed on to players who previously beat the loser
pub const DAMPENING_FACTOR: f64 = 0.1;

/// Result of applying the update rule to one match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingCalculation {
    /// Probability the winner was expected to win (0.0 to 1.0)
    pub expected_win: f64,
    pub margin_factor: f64,
    /// Points moved from loser to winner, before flooring
    pub rating_change: f64,
    /// Winner's new rating, floored but unrounded
    pub winner_new: f64,
    /// Loser's new rating, floored but unrounded
    pub loser_new: f64,
}

impl RatingCalculation {
    /// Correction applied to each predecessor of the loser
    pub fn propagated_change(&self) -> f64 {
        self.rating_change * DAMPENING_FACTOR
    }
}

/// Logistic probability that a player rated `rating` beats one rated `opponent_rating`
pub fn expected_score(rating: f64, opponent_rating: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent_rating - rating) / SCALE_DIVISOR))
}

/// Multiplier derived from the margin of victory
pub fn margin_factor(score_diff: i64) -> f64 {
    1.0 + score_diff as f64 / MARGIN_DIVISOR
}

/// Apply the update rule to a winner/loser rating pair
pub fn calculate(winner_rating: f64, loser_rating: f64, score_diff: i64) -> RatingCalculation {
    let expected_win = expected_score(winner_rating, loser_rating);
    let margin_factor = margin_factor(score_diff);
    let rating_change = K_FACTOR * margin_factor * (1.0 - expected_win);

    RatingCalculation {
        expected_win,
        margin_factor,
        rating_change,
        winner_new: floor_rating(winner_rating + rating_change),
        loser_new: floor_rating(loser_rating - rating_change),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::graph::RATING_FLOOR;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_expected_score_even_match() {
        assert_eq!(expected_score(10.0, 10.0), 0.5);
        assert_eq!(expected_score(1500.0, 1500.0), 0.5);
    }

    #[test]
    fn test_expected_score_is_symmetric() {
        let p = expected_score(20.0, 10.0);
        let q = expected_score(10.0, 20.0);
        assert!((p + q - 1.0).abs() < EPSILON);
        assert!(p > 0.5);
    }

    #[test]
    fn test_expected_score_scale() {
        // A 50 point gap means 10:1 odds
        let p = expected_score(60.0, 10.0);
        assert!((p - 10.0 / 11.0).abs() < EPSILON);
    }

    #[test]
    fn test_margin_factor() {
        assert_eq!(margin_factor(0), 1.0);
        assert_eq!(margin_factor(6), 2.0);
        assert!((margin_factor(3) - 1.5).abs() < EPSILON);
    }

    #[test]
    fn test_even_match_with_margin() {
        let calc = calculate(10.0, 10.0, 6);
        assert_eq!(calc.expected_win, 0.5);
        assert_eq!(calc.margin_factor, 2.0);
        assert_eq!(calc.rating_change, 5.0);
        assert_eq!(calc.winner_new, 15.0);
        assert_eq!(calc.loser_new, 5.0);
        assert!((calc.propagated_change() - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_favourite_wins() {
        let calc = calculate(20.0, 10.0, 0);
        assert!((calc.expected_win - 0.613_136_820_153).abs() < 1e-9);
        assert!((calc.rating_change - 1.934_315_899_234).abs() < 1e-9);
        assert!((calc.winner_new - 21.934_315_899_234).abs() < 1e-9);
        assert!((calc.loser_new - 8.065_684_100_766).abs() < 1e-9);
    }

    #[test]
    fn test_upset_moves_more_points() {
        let expected = calculate(20.0, 10.0, 2);
        let upset = calculate(10.0, 20.0, 2);
        assert!(upset.rating_change > expected.rating_change);
    }

    #[test]
    fn test_loser_floored() {
        let calc = calculate(10.0, 4.0, 6);
        assert!(calc.loser_new >= RATING_FLOOR);
        assert_eq!(calc.loser_new, RATING_FLOOR);
        // The change itself is not clamped
        assert!(calc.rating_change > 1.0);
    }

    #[test]
    fn test_deterministic() {
        let a = calculate(13.7, 9.2, 4);
        let b = calculate(13.7, 9.2, 4);
        assert_eq!(a, b);
    }
}
