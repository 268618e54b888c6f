//! Repository functions for stored predictions.

use air_quality_structs::{CreatePrediction, PredictionRecord};
use sqlx::PgPool;
use uuid::Uuid;

/// Inserts a new prediction record.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn insert_prediction(
    pool: &PgPool,
    input: CreatePrediction,
) -> Result<PredictionRecord, sqlx::Error> {
    sqlx::query_as::<_, PredictionRecord>(
        r"
        INSERT INTO aqi_predictions (id, city, prediction_time, predicted_aqi, model_name)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, city, prediction_time, predicted_aqi, model_name
        ",
    )
    .bind(Uuid::new_v4())
    .bind(input.city)
    .bind(input.prediction_time)
    .bind(input.predicted_aqi)
    .bind(input.model_name)
    .fetch_one(pool)
    .await
}

/// Finds the most recent prediction for a city.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn find_latest_prediction(
    pool: &PgPool,
    city: &str,
) -> Result<Option<PredictionRecord>, sqlx::Error> {
    sqlx::query_as::<_, PredictionRecord>(
        r"
        SELECT id, city, prediction_time, predicted_aqi, model_name
        FROM aqi_predictions
        WHERE city = $1
        ORDER BY prediction_time DESC
        LIMIT 1
        ",
    )
    .bind(city)
    .fetch_optional(pool)
    .await
}

/// Lists up to `limit` predictions for a city, newest first.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn list_recent_predictions(
    pool: &PgPool,
    city: &str,
    limit: i64,
) -> Result<Vec<PredictionRecord>, sqlx::Error> {
    sqlx::query_as::<_, PredictionRecord>(
        r"
        SELECT id, city, prediction_time, predicted_aqi, model_name
        FROM aqi_predictions
        WHERE city = $1
        ORDER BY prediction_time DESC
        LIMIT $2
        ",
    )
    .bind(city)
    .bind(limit)
    .fetch_all(pool)
    .await
}
