//! Confidence scoring from provider metadata
//!
//! `confidence = 0.7 + importance * 0.2 + min(details * 0.02, 0.1)`,
//! clamped to [0, 1]. Missing importance counts as 0.5.

use super::provider::PlaceMetadata;

/// Heuristic 0–1 reliability score for a resolved place
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceScorer {
    baseline: f64,
    importance_weight: f64,
    default_importance: f64,
    detail_weight: f64,
    detail_cap: f64,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self {
            baseline: 0.7,
            importance_weight: 0.2,
            default_importance: 0.5,
            detail_weight: 0.02,
            detail_cap: 0.1,
        }
    }
}

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self, metadata: &PlaceMetadata) -> f64 {
        let importance = metadata.importance.unwrap_or(self.default_importance);
        let detail_bonus =
            (metadata.detail_field_count() as f64 * self.detail_weight).min(self.detail_cap);

        let confidence = self.baseline + importance * self.importance_weight + detail_bonus;
        confidence.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn details(count: usize) -> Map<String, Value> {
        (0..count).map(|i| (format!("field{}", i), json!("x"))).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_default_importance_without_details() {
        let score = ConfidenceScorer::new().score(&PlaceMetadata::default());
        assert!(approx(score, 0.8));
    }

    #[test]
    fn test_importance_and_details() {
        let metadata = PlaceMetadata {
            importance: Some(0.25),
            address_details: details(3),
        };
        // 0.7 + 0.05 + 0.06
        assert!(approx(ConfidenceScorer::new().score(&metadata), 0.81));
    }

    #[test]
    fn test_detail_bonus_is_capped() {
        let metadata = PlaceMetadata {
            importance: Some(0.0),
            address_details: details(12),
        };
        assert!(approx(ConfidenceScorer::new().score(&metadata), 0.8));
    }

    #[test]
    fn test_clamped_to_one() {
        let metadata = PlaceMetadata {
            importance: Some(1.0),
            address_details: details(10),
        };
        assert!(approx(ConfidenceScorer::new().score(&metadata), 1.0));
    }

    #[test]
    fn test_clamped_to_zero_for_negative_importance() {
        let metadata = PlaceMetadata {
            importance: Some(-10.0),
            address_details: Map::new(),
        };
        assert_eq!(ConfidenceScorer::new().score(&metadata), 0.0);
    }
}
