//! Utility functions for the rating service

use uuid::Uuid;

/// Generate a new unique request ID for log correlation
pub fn generate_request_id() -> Uuid {
    Uuid::new_v4()
}

/// Round a rating to two decimal places for presentation
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean, or `None` for an empty input
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_ids() {
        let id1 = generate_request_id();
        let id2 = generate_request_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(21.934315899), 21.93);
        assert_eq!(round2(8.065684100), 8.07);
        assert_eq!(round2(15.0), 15.0);
        assert_eq!(round2(-1.236), -1.24);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[4.0]), Some(4.0));
        assert_eq!(mean(&[3.0, 5.0, 10.0]), Some(6.0));
    }
}
