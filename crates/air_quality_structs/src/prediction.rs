use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A stored AQI prediction for a city.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub city: String,
    pub prediction_time: DateTime<Utc>,
    pub predicted_aqi: f64,
    pub model_name: String,
}

/// Input for creating a new prediction record.
#[derive(Debug, Clone)]
pub struct CreatePrediction {
    pub city: String,
    pub prediction_time: DateTime<Utc>,
    pub predicted_aqi: f64,
    pub model_name: String,
}
