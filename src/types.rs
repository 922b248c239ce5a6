//! Common types used throughout the rating service

use crate::error::RatingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for players
pub type PlayerId = String;

/// A completed match as consumed by the rating engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub winner: PlayerId,
    pub loser: PlayerId,
    /// Winner's rating going into this match, as reported by the caller
    pub winner_rating: f64,
    /// Loser's rating going into this match, as reported by the caller
    pub loser_rating: f64,
    /// Margin of victory (games won minus games lost)
    pub score_diff: i64,
}

impl MatchResult {
    pub fn new(
        winner: impl Into<PlayerId>,
        loser: impl Into<PlayerId>,
        winner_rating: f64,
        loser_rating: f64,
        score_diff: i64,
    ) -> Self {
        Self {
            winner: winner.into(),
            loser: loser.into(),
            winner_rating,
            loser_rating,
            score_diff,
        }
    }

    /// Reject results the update rule is not defined for
    pub fn validate(&self) -> crate::error::Result<()> {
        let invalid = |reason: &str| -> anyhow::Error {
            RatingError::InvalidMatch {
                reason: reason.to_string(),
            }
            .into()
        };

        if self.winner.trim().is_empty() || self.loser.trim().is_empty() {
            return Err(invalid("winner and loser must be non-empty"));
        }
        if self.winner == self.loser {
            return Err(invalid("winner and loser must be different players"));
        }
        if !self.winner_rating.is_finite() || !self.loser_rating.is_finite() {
            return Err(invalid("ratings must be finite numbers"));
        }
        if self.score_diff < 0 {
            return Err(invalid("scoreDiff must be non-negative"));
        }

        Ok(())
    }
}

/// New ratings produced by a single match update, rounded to 2 decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub winner_new_rating: f64,
    pub loser_new_rating: f64,
}

/// Snapshot of a player node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerNode {
    pub id: PlayerId,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

// HTTP request/response schemas

/// Body of `POST /update-rating`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMatchRequest {
    pub winner: String,
    pub loser: String,
    pub winner_rating: f64,
    pub loser_rating: f64,
    pub score_diff: i64,
}

impl SubmitMatchRequest {
    /// Validate the payload and convert it into the engine's input type
    pub fn into_match_result(self) -> crate::error::Result<MatchResult> {
        let result = MatchResult {
            winner: self.winner,
            loser: self.loser,
            winner_rating: self.winner_rating,
            loser_rating: self.loser_rating,
            score_diff: self.score_diff,
        };
        result.validate()?;
        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMatchResponse {
    pub winner_new_rating: f64,
    pub loser_new_rating: f64,
}

impl From<RatingUpdate> for SubmitMatchResponse {
    fn from(update: RatingUpdate) -> Self {
        Self {
            winner_new_rating: update.winner_new_rating,
            loser_new_rating: update.loser_new_rating,
        }
    }
}

/// Body of `POST /predict-unplayed`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub player1: String,
    pub player2: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub estimated_rating_diff: f64,
}

/// Body of `POST /predict-outcome`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictOutcomeRequest {
    pub player1_rating: f64,
    pub player2_rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictOutcomeResponse {
    pub player1_win_probability: f64,
    pub player2_win_probability: f64,
}

/// Response of `GET /players/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Players whose most recent recorded result against this player was a win
    pub beaten_by: Vec<PlayerId>,
}

/// Error payload returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_reason(result: crate::error::Result<()>) -> String {
        match result.unwrap_err().downcast::<RatingError>().unwrap() {
            RatingError::InvalidMatch { reason } => reason,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_valid_match_result() {
        let result = MatchResult::new("alcaraz", "sinner", 10.0, 12.0, 3);
        assert!(result.validate().is_ok());

        // Zero margin is allowed
        let result = MatchResult::new("alcaraz", "sinner", 10.0, 12.0, 0);
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_negative_score_diff_rejected() {
        let result = MatchResult::new("alcaraz", "sinner", 10.0, 12.0, -2);
        assert_eq!(
            invalid_reason(result.validate()),
            "scoreDiff must be non-negative"
        );
    }

    #[test]
    fn test_self_match_rejected() {
        let result = MatchResult::new("alcaraz", "alcaraz", 10.0, 10.0, 1);
        assert_eq!(
            invalid_reason(result.validate()),
            "winner and loser must be different players"
        );
    }

    #[test]
    fn test_non_finite_rating_rejected() {
        let result = MatchResult::new("alcaraz", "sinner", f64::NAN, 10.0, 1);
        assert_eq!(
            invalid_reason(result.validate()),
            "ratings must be finite numbers"
        );

        let result = MatchResult::new("alcaraz", "sinner", 10.0, f64::INFINITY, 1);
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_empty_ids_rejected() {
        let result = MatchResult::new("", "sinner", 10.0, 10.0, 1);
        assert!(result.validate().is_err());
        let result = MatchResult::new("alcaraz", "  ", 10.0, 10.0, 1);
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_submit_request_uses_camel_case() {
        let json = serde_json::json!({
            "winner": "alcaraz",
            "loser": "sinner",
            "winnerRating": 10.0,
            "loserRating": 12.5,
            "scoreDiff": 4
        });

        let request: SubmitMatchRequest = serde_json::from_value(json).unwrap();
        let result = request.into_match_result().unwrap();
        assert_eq!(result.winner, "alcaraz");
        assert_eq!(result.loser_rating, 12.5);
        assert_eq!(result.score_diff, 4);
    }

    #[test]
    fn test_response_serialization() {
        let response = SubmitMatchResponse::from(RatingUpdate {
            winner_new_rating: 15.0,
            loser_new_rating: 5.0,
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["winnerNewRating"], 15.0);
        assert_eq!(value["loserNewRating"], 5.0);

        let value = serde_json::to_value(EstimateResponse {
            estimated_rating_diff: -1.25,
        })
        .unwrap();
        assert_eq!(value["estimatedRatingDiff"], -1.25);
    }
}
