//! Shared application state injected into every handler.

use std::sync::Arc;

use air_quality_structs::{CreatePrediction, PredictionRecord};
use async_trait::async_trait;
use ml_model::AqiPredictor;
use openweather_client::AirQualityProvider;
use sqlx::PgPool;

/// Read and write access to stored predictions.
#[async_trait]
pub trait PredictionHistory: Send + Sync {
    async fn record(&self, prediction: CreatePrediction) -> Result<(), sqlx::Error>;

    async fn latest(&self, city: &str) -> Result<Option<PredictionRecord>, sqlx::Error>;

    /// Returns up to `limit` predictions for `city`, newest first.
    async fn recent(&self, city: &str, limit: u32) -> Result<Vec<PredictionRecord>, sqlx::Error>;
}

/// [`PredictionHistory`] backed by the `aqi_predictions` table.
pub struct PgPredictionHistory {
    pool: PgPool,
}

impl PgPredictionHistory {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PredictionHistory for PgPredictionHistory {
    async fn record(&self, prediction: CreatePrediction) -> Result<(), sqlx::Error> {
        database::insert_prediction(&self.pool, prediction).await?;
        Ok(())
    }

    async fn latest(&self, city: &str) -> Result<Option<PredictionRecord>, sqlx::Error> {
        database::find_latest_prediction(&self.pool, city).await
    }

    async fn recent(&self, city: &str, limit: u32) -> Result<Vec<PredictionRecord>, sqlx::Error> {
        database::list_recent_predictions(&self.pool, city, i64::from(limit)).await
    }
}

/// Per-process settings the handlers need.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Model name reported in responses and written with predictions
    pub model_name: String,
    /// Whether `/predict/city` results are stored
    pub persist_predictions: bool,
}

/// Everything a request handler can reach, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<AqiPredictor>,
    pub provider: Arc<dyn AirQualityProvider>,
    pub history: Arc<dyn PredictionHistory>,
    pub settings: Arc<ServiceSettings>,
}

impl AppState {
    #[must_use]
    pub fn new(
        predictor: AqiPredictor,
        provider: Arc<dyn AirQualityProvider>,
        history: Arc<dyn PredictionHistory>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            predictor: Arc::new(predictor),
            provider,
            history,
            settings: Arc::new(settings),
        }
    }
}
