use shared::{Label, PredictionResponse};

/// Scores strictly above this are positive.
pub const DECISION_THRESHOLD: f64 = 0.5;

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub label: Label,
    /// Percentage in `[50, 100]`, rounded to two decimals.
    pub confidence: f64,
}

impl PredictionResult {
    /// `score` must lie in `[0, 1]`.
    pub fn from_score(score: f64) -> Self {
        let (label, confidence) = if score > DECISION_THRESHOLD {
            (Label::Detected, score * 100.0)
        } else {
            (Label::NotDetected, (1.0 - score) * 100.0)
        };
        Self {
            label,
            confidence: (confidence * 100.0).round() / 100.0,
        }
    }
}

impl From<PredictionResult> for PredictionResponse {
    fn from(result: PredictionResult) -> Self {
        PredictionResponse {
            prediction: result.label,
            confidence: result.confidence,
        }
    }
}
