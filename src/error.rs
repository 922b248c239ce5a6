//! Error types for the rating service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingError {
    /// Raised by the graph store when a rating is read or written for an unknown node
    #[error("Node not found: {player_id}")]
    NodeNotFound { player_id: String },

    /// Raised by the engine when an estimation names an unknown player
    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: String },

    #[error("Invalid match result: {reason}")]
    InvalidMatch { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl RatingError {
    /// Whether this error means a player id was not known to the store
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RatingError::NodeNotFound { .. } | RatingError::PlayerNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RatingError::PlayerNotFound {
            player_id: "federer".to_string(),
        };
        assert_eq!(err.to_string(), "Player not found: federer");

        let err = RatingError::InvalidMatch {
            reason: "scoreDiff must be non-negative".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid match result: scoreDiff must be non-negative"
        );
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let result: Result<()> = Err(RatingError::NodeNotFound {
            player_id: "nadal".to_string(),
        }
        .into());

        let err = result.unwrap_err();
        let rating_error = err.downcast_ref::<RatingError>().unwrap();
        assert!(rating_error.is_not_found());
    }

    #[test]
    fn test_is_not_found() {
        assert!(!RatingError::InternalError {
            message: "poisoned".to_string()
        }
        .is_not_found());
        assert!(RatingError::PlayerNotFound {
            player_id: "x".to_string()
        }
        .is_not_found());
    }
}
