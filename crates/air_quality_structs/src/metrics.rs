use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Evaluation metrics recorded for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ModelMetrics {
    pub id: Uuid,
    pub model_name: String,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub trained_at: DateTime<Utc>,
}

/// Input for creating a new model metrics record.
#[derive(Debug, Clone)]
pub struct CreateModelMetrics {
    pub model_name: String,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}
