use actix_web::{App, HttpServer, web};
use screening_backend::config::{DEFAULT_CONFIG_PATH, ServingConfig};
use screening_backend::routes::{configure_routes, cors};
use screening_backend::{InferenceService, Predictor};
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    }

    let config_path = env::var("SERVING_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = ServingConfig::load(&config_path).map_err(std::io::Error::other)?;
    config
        .apply_env_overrides(|key| env::var(key).ok())
        .map_err(std::io::Error::other)?;
    log::info!(
        "Raster target {:?}, volume target {:?}, volume suffixes {:?}",
        config.preprocessing.raster.size,
        config.preprocessing.volumetric.shape,
        config.preprocessing.volumetric.extensions
    );

    let inference = InferenceService::from_config(&config.model);
    if let Some(reason) = inference.unavailable_reason() {
        log::error!("Model unavailable ({reason}); every prediction will fail");
    }
    let predictor = web::Data::new(Predictor::new(&config, inference));

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let allowed_origins = config.server.allowed_origins.clone();

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(cors(&allowed_origins))
            .app_data(predictor.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
