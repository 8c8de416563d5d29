use std::sync::Mutex;

use crate::config::{ModelConfig, ModelOutput};
use crate::error::PredictionError;
use crate::preprocess::NormalizedTensor;

use super::decision::sigmoid;

pub type ScoreResult = Result<f32, Box<dyn std::error::Error + Send + Sync>>;

/// An opaque trained classifier.
pub trait Scorer: Send {
    /// Returns the positive-class output for one batch-of-one tensor.
    fn score(&self, input: &NormalizedTensor) -> ScoreResult;
}

impl<F> Scorer for F
where
    F: Fn(&NormalizedTensor) -> ScoreResult + Send,
{
    fn score(&self, input: &NormalizedTensor) -> ScoreResult {
        self(input)
    }
}

enum ModelState {
    Loaded {
        scorer: Mutex<Box<dyn Scorer>>,
        output: ModelOutput,
    },
    Unavailable {
        reason: String,
    },
}

/// Holds the classifier for the lifetime of the process. Calls into the
/// scorer are serialized.
pub struct InferenceService {
    state: ModelState,
}

impl InferenceService {
    pub fn loaded(scorer: impl Scorer + 'static, output: ModelOutput) -> Self {
        Self {
            state: ModelState::Loaded {
                scorer: Mutex::new(Box::new(scorer)),
                output,
            },
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: ModelState::Unavailable { reason: reason.into() },
        }
    }

    /// Loads the configured model. Failure leaves the service unavailable
    /// rather than aborting startup.
    pub fn from_config(config: &ModelConfig) -> Self {
        let Some(path) = config.path.as_deref() else {
            log::warn!("No model path configured; predictions will fail");
            return Self::unavailable("no model path configured");
        };
        log::info!("Loading model from {}", path.display());
        load_scorer(path, config)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModelState::Loaded { .. })
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            ModelState::Loaded { .. } => None,
            ModelState::Unavailable { reason } => Some(reason),
        }
    }

    pub fn ensure_available(&self) -> Result<(), PredictionError> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(PredictionError::ModelUnavailable)
        }
    }

    /// Runs the classifier and returns a probability in `[0, 1]`.
    pub fn score(&self, input: &NormalizedTensor) -> Result<f64, PredictionError> {
        let ModelState::Loaded { scorer, output } = &self.state else {
            return Err(PredictionError::ModelUnavailable);
        };
        let raw = {
            let scorer = scorer
                .lock()
                .map_err(|_| PredictionError::Inference("Model lock poisoned".to_string()))?;
            scorer
                .score(input)
                .map_err(|e| PredictionError::Inference(e.to_string()))?
        };
        let raw = f64::from(raw);
        let probability = match output {
            ModelOutput::Probability => raw,
            ModelOutput::Logit => sigmoid(raw),
        };
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(PredictionError::Inference(format!(
                "Model returned score {raw} outside [0, 1]"
            )));
        }
        Ok(probability)
    }
}

#[cfg(feature = "torch")]
fn load_scorer(path: &std::path::Path, config: &ModelConfig) -> InferenceService {
    match super::torch::TorchScorer::load(path, config.device) {
        Ok(scorer) => {
            log::info!("Model loaded successfully");
            InferenceService::loaded(scorer, config.output)
        }
        Err(e) => {
            log::error!("Error loading model: {e}");
            InferenceService::unavailable(e.to_string())
        }
    }
}

#[cfg(not(feature = "torch"))]
fn load_scorer(path: &std::path::Path, _config: &ModelConfig) -> InferenceService {
    log::error!("Built without the `torch` feature; cannot load {}", path.display());
    InferenceService::unavailable("built without a model runtime")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VolumetricConfig;
    use crate::preprocess::volume::normalize_volume;
    use ndarray::Array3;

    fn tensor() -> NormalizedTensor {
        let volume = Array3::from_shape_fn((2, 2, 2), |(d, h, w)| (d + h + w) as f32);
        normalize_volume(
            volume,
            &VolumetricConfig {
                shape: [2, 2, 2],
                ..VolumetricConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn unavailable_service_fails_fast() {
        let service = InferenceService::unavailable("missing weights");
        assert!(!service.is_loaded());
        assert_eq!(service.unavailable_reason(), Some("missing weights"));
        assert!(matches!(service.ensure_available(), Err(PredictionError::ModelUnavailable)));
        assert!(matches!(service.score(&tensor()), Err(PredictionError::ModelUnavailable)));
    }

    #[test]
    fn closure_scorer_passes_probability_through() {
        let service = InferenceService::loaded(|_: &NormalizedTensor| -> ScoreResult { Ok(0.75) }, ModelOutput::Probability);
        assert!(service.is_loaded());
        assert_eq!(service.score(&tensor()).unwrap(), 0.75);
    }

    #[test]
    fn logit_output_goes_through_sigmoid() {
        let service = InferenceService::loaded(|_: &NormalizedTensor| -> ScoreResult { Ok(0.0) }, ModelOutput::Logit);
        assert!((service.score(&tensor()).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn scorer_failure_becomes_inference_error() {
        let service = InferenceService::loaded(
            |_: &NormalizedTensor| -> ScoreResult { Err("forward pass exploded".into()) },
            ModelOutput::Probability,
        );
        match service.score(&tensor()) {
            Err(PredictionError::Inference(msg)) => assert_eq!(msg, "forward pass exploded"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        for bad in [1.5f32, -0.1, f32::NAN] {
            let service = InferenceService::loaded(move |_: &NormalizedTensor| -> ScoreResult { Ok(bad) }, ModelOutput::Probability);
            assert!(matches!(service.score(&tensor()), Err(PredictionError::Inference(_))));
        }
    }

    #[test]
    fn missing_model_path_starts_unavailable() {
        let service = InferenceService::from_config(&ModelConfig::default());
        assert!(!service.is_loaded());
    }
}
