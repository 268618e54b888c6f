//! Repository functions for training run metrics.

use air_quality_structs::{CreateModelMetrics, ModelMetrics};
use sqlx::PgPool;
use uuid::Uuid;

/// Appends the metrics of a training run.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn insert_model_metrics(
    pool: &PgPool,
    input: CreateModelMetrics,
) -> Result<ModelMetrics, sqlx::Error> {
    sqlx::query_as::<_, ModelMetrics>(
        r"
        INSERT INTO model_metrics (id, model_name, mae, rmse, r2)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, model_name, mae, rmse, r2, trained_at
        ",
    )
    .bind(Uuid::new_v4())
    .bind(input.model_name)
    .bind(input.mae)
    .bind(input.rmse)
    .bind(input.r2)
    .fetch_one(pool)
    .await
}

/// Finds the most recent metrics recorded for a model name.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn find_latest_model_metrics(
    pool: &PgPool,
    model_name: &str,
) -> Result<Option<ModelMetrics>, sqlx::Error> {
    sqlx::query_as::<_, ModelMetrics>(
        r"
        SELECT id, model_name, mae, rmse, r2, trained_at
        FROM model_metrics
        WHERE model_name = $1
        ORDER BY trained_at DESC
        LIMIT 1
        ",
    )
    .bind(model_name)
    .fetch_optional(pool)
    .await
}
