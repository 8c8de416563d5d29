pub mod config;
pub mod error;
pub mod inference;
pub mod modality;
pub mod pipeline;
pub mod preprocess;
pub mod routes;
pub mod upload;

pub use error::{ConfigError, PredictionError};
pub use inference::{InferenceService, PredictionResult, Scorer};
pub use modality::Modality;
pub use pipeline::Predictor;
pub use preprocess::{NormalizedTensor, Preprocessor};
pub use upload::UploadedFile;
