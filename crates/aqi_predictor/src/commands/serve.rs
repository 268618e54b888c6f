//! Serve command - runs the HTTP API.

use std::sync::Arc;

use anyhow::{Context, Result};
use config::Config;
use database::create_pool;
use feature_extractor::NormalizationOptions;
use ml_model::AqiPredictor;
use openweather_client::OpenWeatherClient;
use tracing::info;

use crate::server::{self, AppState, PgPredictionHistory, ServiceSettings};

/// Runs the serve command.
///
/// The model artifact is loaded before anything is bound, so a missing or
/// incompatible model stops startup.
///
/// # Errors
///
/// Returns an error if the model, provider, database or listener cannot be
/// set up, or if the server fails.
pub async fn run(config: &Config) -> Result<()> {
    let options = NormalizationOptions {
        floor_negative: config.floor_negative_readings,
    };
    let predictor = AqiPredictor::from_path(&config.model_path, options)
        .context("Failed to load model artifact")?;

    let provider = OpenWeatherClient::new(
        config.require_openweather_api_key()?,
        &config.openweather_base_url,
        config.http_timeout,
    )?;

    let pool = create_pool(&config.database)
        .await
        .context("Failed to connect to the database")?;

    info!(
        model = %config.model_name,
        persist_predictions = config.persist_predictions,
        floor_negative = config.floor_negative_readings,
        "Starting AQI service"
    );

    let state = AppState::new(
        predictor,
        Arc::new(provider),
        Arc::new(PgPredictionHistory::new(pool)),
        ServiceSettings {
            model_name: config.model_name.clone(),
            persist_predictions: config.persist_predictions,
        },
    );

    let router = server::build_router(state, &config.cors_origin)?;
    server::serve(router, config.bind_addr).await
}
