use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Binary diagnostic outcome reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, Serialize, Deserialize)]
pub enum Label {
    #[strum(serialize = "Autism Detected")]
    #[serde(rename = "Autism Detected")]
    Detected,
    #[strum(serialize = "No Autism Detected")]
    #[serde(rename = "No Autism Detected")]
    NotDetected,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionResponse {
    pub prediction: Label,
    pub confidence: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}
