//! Drug-likeness classification of a raw model score.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores at or above this value are labelled drug-like.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Binary label derived from the classifier score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrugLikeness {
    #[serde(rename = "Drug-Like")]
    DrugLike,
    #[serde(rename = "Non-Drug-Like")]
    NonDrugLike,
}

impl DrugLikeness {
    /// Label a score against `threshold` (inclusive).
    pub fn classify(score: f32, threshold: f32) -> Self {
        if score >= threshold {
            DrugLikeness::DrugLike
        } else {
            DrugLikeness::NonDrugLike
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DrugLikeness::DrugLike => "Drug-Like",
            DrugLikeness::NonDrugLike => "Non-Drug-Like",
        }
    }

    pub fn is_drug_like(&self) -> bool {
        matches!(self, DrugLikeness::DrugLike)
    }
}

impl fmt::Display for DrugLikeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a successful `/predict` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub smiles: String,
    pub prediction: DrugLikeness,
    /// Score rounded to two decimals.
    pub score: f64,
    /// Base64 PNG of the 2D structure; `None` when it could not be drawn.
    pub image_2d: Option<String>,
}

impl PredictionResult {
    pub fn new(smiles: impl Into<String>, score: f32, threshold: f32, image_2d: Option<String>) -> Self {
        Self {
            smiles: smiles.into(),
            prediction: DrugLikeness::classify(score, threshold),
            score: round_score(score),
            image_2d,
        }
    }
}

/// Round a score to two decimal places.
pub fn round_score(score: f32) -> f64 {
    (f64::from(score) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(DrugLikeness::classify(0.5, DEFAULT_THRESHOLD), DrugLikeness::DrugLike);
        assert_eq!(DrugLikeness::classify(0.4999, DEFAULT_THRESHOLD), DrugLikeness::NonDrugLike);
        assert_eq!(DrugLikeness::classify(1.0, DEFAULT_THRESHOLD), DrugLikeness::DrugLike);
        assert_eq!(DrugLikeness::classify(0.0, DEFAULT_THRESHOLD), DrugLikeness::NonDrugLike);
    }

    #[test]
    fn test_round_score_two_decimals() {
        assert_eq!(round_score(0.87654), 0.88);
        assert_eq!(round_score(0.123), 0.12);
        assert_eq!(round_score(1.0), 1.0);
        assert_eq!(round_score(0.0), 0.0);
    }

    #[test]
    fn test_label_serializes_as_plain_text() {
        let result = PredictionResult::new("CCO", 0.731, DEFAULT_THRESHOLD, None);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "smiles": "CCO",
                "prediction": "Drug-Like",
                "score": 0.73,
                "image_2d": null,
            })
        );
    }

    #[test]
    fn test_label_below_threshold() {
        let result = PredictionResult::new("C", 0.2, DEFAULT_THRESHOLD, Some("abc".into()));
        assert_eq!(result.prediction.to_string(), "Non-Drug-Like");
        assert!(!result.prediction.is_drug_like());
    }
}
