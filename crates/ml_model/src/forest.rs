//! Bootstrap-aggregated forest of regression trees.

use anyhow::{Result, ensure};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Dataset;
use crate::tree::{RegressionTree, TreeConfig};

/// Hyperparameters for the random forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Limits applied to every tree.
    pub tree: TreeConfig,
    /// Base seed; tree `t` bootstraps with `seed + t`.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            tree: TreeConfig::default(),
            seed: 42,
        }
    }
}

/// Random forest regressor averaging bounded-depth trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    /// Fits the forest on every row of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset is empty or the forest has no trees.
    pub fn fit(dataset: &Dataset, config: &ForestConfig) -> Result<Self> {
        ensure!(!dataset.is_empty(), "cannot fit a forest on an empty dataset");
        ensure!(config.n_trees > 0, "forest needs at least one tree");

        let features = dataset.features().view();
        let targets = dataset.targets().view();
        let rows = dataset.len();

        let trees = (0..config.n_trees)
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(t as u64));
                let sample: Vec<usize> = (0..rows).map(|_| rng.gen_range(0..rows)).collect();
                let tree = RegressionTree::fit(features, targets, &sample, &config.tree);

                if (t + 1) % 10 == 0 {
                    debug!(trees = t + 1, total = config.n_trees, "Fitted trees");
                }

                tree
            })
            .collect();

        Ok(Self {
            config: *config,
            trees,
        })
    }

    /// Predicts the target for one feature row as the mean over all trees.
    #[must_use]
    pub fn predict_one(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.predict_one(row)).sum();
        #[expect(clippy::cast_precision_loss, reason = "tree counts fit in f64")]
        let count = self.trees.len() as f64;
        sum / count
    }

    /// Predicts every row of a feature matrix.
    #[must_use]
    pub fn predict(&self, features: &Array2<f64>) -> Array1<f64> {
        features
            .axis_iter(Axis(0))
            .map(|row| self.predict_one(&row.to_vec()))
            .collect()
    }

    #[must_use]
    pub const fn config(&self) -> &ForestConfig {
        &self.config
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
