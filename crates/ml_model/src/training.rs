//! Training routine comparing the linear baseline with the forest.

use core::cmp::Ordering;

use air_quality_structs::LabeledReading;
use anyhow::{Context, Result, ensure};
use feature_extractor::{FEATURE_COUNT, feature_vector};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Dataset, ForestConfig, LinearModel, RandomForestRegressor, RegressionMetrics};

/// Configuration for a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation.
    pub test_ratio: f64,
    /// Seed for the train/test shuffle.
    pub seed: u64,
    /// Forest hyperparameters.
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            forest: ForestConfig::default(),
        }
    }
}

/// Output from training.
#[derive(Debug, Clone)]
pub struct TrainingOutput {
    /// Held-out metrics of the linear baseline.
    pub baseline: RegressionMetrics,
    /// Held-out metrics of the random forest.
    pub ensemble: RegressionMetrics,
    /// The fitted forest, which is what gets persisted.
    pub model: RandomForestRegressor,
    /// Rows used for fitting.
    pub train_rows: usize,
    /// Rows used for evaluation.
    pub test_rows: usize,
}

/// Splits the rows, fits both regressors and evaluates them on the test set.
///
/// Rows are put in a canonical order first, so the result depends only on
/// which rows are given and not on the order the store returned them in.
///
/// # Errors
///
/// Returns an error if there are no rows, the split leaves an empty
/// partition, or either model fails to fit.
pub fn train_and_evaluate(rows: &[LabeledReading], config: &TrainingConfig) -> Result<TrainingOutput> {
    ensure!(!rows.is_empty(), "No training data provided");

    let mut rows = rows.to_vec();
    rows.sort_by(canonical_order);

    let dataset = Dataset::from_labeled(&rows);
    let (train, test) = dataset
        .train_test_split(config.test_ratio, config.seed)
        .context("Failed to split training data")?;

    info!(train = train.len(), test = test.len(), "Split dataset");

    let baseline_model = LinearModel::fit(&train).context("Failed to fit linear baseline")?;
    let baseline = RegressionMetrics::evaluate(test.targets(), &baseline_model.predict(test.features()));

    info!(
        trees = config.forest.n_trees,
        max_depth = config.forest.tree.max_depth,
        "Fitting random forest"
    );
    let model = RandomForestRegressor::fit(&train, &config.forest).context("Failed to fit random forest")?;
    let ensemble = RegressionMetrics::evaluate(test.targets(), &model.predict(test.features()));
    info!(
        trees = model.n_trees(),
        max_depth = model.config().tree.max_depth,
        seed = model.config().seed,
        "Fitted random forest"
    );

    info!(
        mae = baseline.mae,
        rmse = baseline.rmse,
        r2 = baseline.r2,
        "Linear regression"
    );
    info!(
        mae = ensemble.mae,
        rmse = ensemble.rmse,
        r2 = ensemble.r2,
        "Random forest"
    );

    Ok(TrainingOutput {
        baseline,
        ensemble,
        model,
        train_rows: train.len(),
        test_rows: test.len(),
    })
}

fn sort_key(row: &LabeledReading) -> [f64; FEATURE_COUNT + 1] {
    let mut key = [0.0; FEATURE_COUNT + 1];
    key[..FEATURE_COUNT].copy_from_slice(&feature_vector(&row.reading));
    key[FEATURE_COUNT] = row.aqi;
    key
}

fn canonical_order(a: &LabeledReading, b: &LabeledReading) -> Ordering {
    sort_key(a)
        .iter()
        .zip(sort_key(b).iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|order| order.is_ne())
        .unwrap_or(Ordering::Equal)
}
