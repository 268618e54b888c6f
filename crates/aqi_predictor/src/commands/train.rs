//! Train command - fits the regressors on stored history and saves the forest.

use std::path::Path;

use air_quality_structs::CreateModelMetrics;
use anyhow::{Context, Result};
use database::{find_latest_model_metrics, insert_model_metrics, load_training_rows};
use ml_model::{ModelArtifact, TrainedModel, TrainingConfig, save_checkpoint, train_and_evaluate};
use sqlx::PgPool;
use tracing::info;

/// Runs the train command.
///
/// # Errors
///
/// Returns an error if loading, training, saving or recording metrics fails.
pub async fn run(pool: &PgPool, model_name: &str, output: &Path, config: &TrainingConfig) -> Result<()> {
    info!(model_name, "Starting training");

    let rows = load_training_rows(pool)
        .await
        .context("Failed to load training data")?;
    if rows.is_empty() {
        anyhow::bail!("No training data found. Please run `aqi ingest` first.");
    }

    info!(samples = rows.len(), "Loaded training samples");

    let trained = train_and_evaluate(&rows, config)?;

    if let Some(previous) = find_latest_model_metrics(pool, model_name).await? {
        info!(
            previous_r2 = previous.r2,
            r2 = trained.ensemble.r2,
            previous_trained_at = %previous.trained_at,
            "Compared with previous run"
        );
    }

    let artifact = ModelArtifact::new(model_name, TrainedModel::RandomForest(trained.model));
    save_checkpoint(&artifact, output).context("Failed to save model artifact")?;

    let metrics = insert_model_metrics(
        pool,
        CreateModelMetrics {
            model_name: model_name.to_string(),
            mae: trained.ensemble.mae,
            rmse: trained.ensemble.rmse,
            r2: trained.ensemble.r2,
        },
    )
    .await
    .context("Failed to record model metrics")?;

    info!(
        model_name,
        path = %output.display(),
        metrics_id = %metrics.id,
        train_rows = trained.train_rows,
        test_rows = trained.test_rows,
        "Training complete"
    );

    Ok(())
}
