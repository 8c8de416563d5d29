use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorResponse;

/// Every way a single prediction request can fail.
///
/// The `Display` text is what clients see in `{ "error": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("Model not loaded")]
    ModelUnavailable,
    #[error("{0}")]
    MissingInput(String),
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    Shape(String),
    #[error("{0}")]
    Inference(String),
}

impl PredictionError {
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::ModelUnavailable => "model_unavailable",
            PredictionError::MissingInput(_) => "missing_input",
            PredictionError::Decode(_) => "decode_error",
            PredictionError::Shape(_) => "shape_error",
            PredictionError::Inference(_) => "inference_error",
        }
    }

    /// True when resubmitting a different file could succeed.
    pub fn is_user_fixable(&self) -> bool {
        matches!(
            self,
            PredictionError::MissingInput(_) | PredictionError::Decode(_) | PredictionError::Shape(_)
        )
    }
}

impl ResponseError for PredictionError {
    fn status_code(&self) -> StatusCode {
        if self.is_user_fixable() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
