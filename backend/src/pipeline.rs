use std::path::PathBuf;
use std::time::Instant;

use crate::config::ServingConfig;
use crate::error::PredictionError;
use crate::inference::{InferenceService, PredictionResult};
use crate::preprocess::Preprocessor;
use crate::upload::UploadedFile;

/// Runs one upload through save, preprocess and score. The saved copy of
/// the upload never outlives the call.
pub struct Predictor {
    preprocessor: Preprocessor,
    inference: InferenceService,
    upload_dir: PathBuf,
    max_upload_bytes: usize,
}

impl Predictor {
    pub fn new(config: &ServingConfig, inference: InferenceService) -> Self {
        Self {
            preprocessor: Preprocessor::new(&config.preprocessing),
            inference,
            upload_dir: config.server.upload_dir.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }

    pub fn inference(&self) -> &InferenceService {
        &self.inference
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn predict(&self, upload: Option<&UploadedFile>) -> Result<PredictionResult, PredictionError> {
        self.inference.ensure_available()?;

        let upload = upload.ok_or_else(|| PredictionError::MissingInput("No image file provided".to_string()))?;
        if upload.filename.trim().is_empty() {
            return Err(PredictionError::MissingInput("No selected file".to_string()));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(upload_too_large(self.max_upload_bytes));
        }

        let started = Instant::now();
        let modality = self.preprocessor.modality_for(&upload.filename);
        let saved = upload.save(&self.upload_dir)?;
        log::debug!("Saved {} upload to {}", modality, saved.path().display());

        let tensor = self.preprocessor.preprocess(saved.path(), modality)?;
        let score = self.inference.score(&tensor)?;
        let result = PredictionResult::from_score(score);

        log::info!(
            "Predicted {} ({:.2}%) for {} input {:?} in {} ms",
            result.label,
            result.confidence,
            modality,
            tensor.shape(),
            started.elapsed().as_millis()
        );
        Ok(result)
    }
}

pub fn upload_too_large(limit: usize) -> PredictionError {
    PredictionError::MissingInput(format!("Uploaded file exceeds {limit} bytes"))
}
