pub mod decision;
pub mod service;
#[cfg(feature = "torch")]
pub mod torch;

pub use decision::{DECISION_THRESHOLD, PredictionResult};
pub use service::{InferenceService, ScoreResult, Scorer};
