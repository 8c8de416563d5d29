use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{error, warn};
use shared::{HealthResponse, PredictionResponse};

use crate::error::PredictionError;
use crate::inference::PredictionResult;
use crate::pipeline::{Predictor, upload_too_large};
use crate::upload::UploadedFile;

/// Multipart field carrying the file.
pub const UPLOAD_FIELD: &str = "image";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(handle_predict)))
        .service(web::resource("/api/predict").route(web::post().to(handle_predict)))
        .service(web::resource("/health").route(web::get().to(health)));
}

pub fn cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::ACCEPT,
            actix_web::http::header::CONTENT_TYPE,
        ])
        .max_age(3600);
    if allowed_origins.is_empty() {
        cors.allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

async fn handle_predict(
    predictor: web::Data<Predictor>,
    payload: Multipart,
) -> Result<HttpResponse, PredictionError> {
    let outcome = run_prediction(predictor, payload).await;
    match outcome {
        Ok(result) => Ok(HttpResponse::Ok().json(PredictionResponse::from(result))),
        Err(e) => {
            if e.is_user_fixable() {
                warn!("Rejected prediction request ({}): {}", e.kind(), e);
            } else {
                error!("Prediction failed ({}): {}", e.kind(), e);
            }
            Err(e)
        }
    }
}

async fn run_prediction(
    predictor: web::Data<Predictor>,
    payload: Multipart,
) -> Result<PredictionResult, PredictionError> {
    // Skip reading the body at all when nothing can score it.
    predictor.inference().ensure_available()?;

    let upload = read_upload(payload, predictor.max_upload_bytes()).await?;
    web::block(move || predictor.predict(upload.as_ref()))
        .await
        .map_err(|e| PredictionError::Inference(format!("Prediction task failed: {e}")))?
}

async fn read_upload(
    mut payload: Multipart,
    limit: usize,
) -> Result<Option<UploadedFile>, PredictionError> {
    let mut upload = None;
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| PredictionError::MissingInput(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if upload.is_some() {
            return Err(PredictionError::MissingInput(
                "Multiple image files provided".to_string(),
            ));
        }
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| PredictionError::MissingInput(format!("Malformed upload: {e}")))?;
            if bytes.len() + data.len() > limit {
                return Err(upload_too_large(limit));
            }
            bytes.extend_from_slice(&data);
        }
        upload = Some(UploadedFile::new(filename, bytes));
    }
    Ok(upload)
}

async fn health(predictor: web::Data<Predictor>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: predictor.inference().is_loaded(),
    })
}
