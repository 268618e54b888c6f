//! Feature matrix and target container used for training.

use air_quality_structs::LabeledReading;
use anyhow::{Result, ensure};
use feature_extractor::{FEATURE_COUNT, feature_vector};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Rows of features laid out by `FEATURE_SCHEMA`, with one target per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Array2<f64>,
    targets: Array1<f64>,
}

impl Dataset {
    /// Creates a dataset from a feature matrix and matching targets.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes disagree or the matrix is not
    /// `FEATURE_COUNT` columns wide.
    #[cfg(test)]
    fn new(features: Array2<f64>, targets: Array1<f64>) -> Result<Self> {
        ensure!(
            features.ncols() == FEATURE_COUNT,
            "expected {FEATURE_COUNT} feature columns, got {}",
            features.ncols()
        );
        ensure!(
            features.nrows() == targets.len(),
            "feature rows ({}) and targets ({}) differ in length",
            features.nrows(),
            targets.len()
        );

        Ok(Self { features, targets })
    }

    /// Builds a dataset from historical observations.
    ///
    /// Historical rows are used as stored, without unit conversion or
    /// clamping.
    #[must_use]
    pub fn from_labeled(rows: &[LabeledReading]) -> Self {
        let mut features = Array2::zeros((rows.len(), FEATURE_COUNT));
        let mut targets = Array1::zeros(rows.len());

        for (i, row) in rows.iter().enumerate() {
            for (j, value) in feature_vector(&row.reading).into_iter().enumerate() {
                features[[i, j]] = value;
            }
            targets[i] = row.aqi;
        }

        Self { features, targets }
    }

    #[must_use]
    pub const fn features(&self) -> &Array2<f64> {
        &self.features
    }

    #[must_use]
    pub const fn targets(&self) -> &Array1<f64> {
        &self.targets
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns a new dataset holding the given rows, in the given order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            targets: self.targets.select(Axis(0), indices),
        }
    }

    /// Shuffles rows with a seeded RNG and splits them into train and test sets.
    ///
    /// The test partition holds `ceil(len * test_ratio)` rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the ratio is outside `(0, 1)` or either partition
    /// would be empty.
    pub fn train_test_split(&self, test_ratio: f64, seed: u64) -> Result<(Self, Self)> {
        ensure!(
            test_ratio > 0.0 && test_ratio < 1.0,
            "test ratio must be between 0 and 1, got {test_ratio}"
        );

        let n = self.len();
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss,
            reason = "row counts are far below 2^52 and the product is non-negative"
        )]
        let test_len = (n as f64 * test_ratio).ceil() as usize;
        ensure!(
            test_len > 0 && test_len < n,
            "cannot split {n} rows with test ratio {test_ratio}"
        );

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let (test_indices, train_indices) = indices.split_at(test_len);
        Ok((self.select(train_indices), self.select(test_indices)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::synthetic_rows;

    #[test]
    fn test_from_labeled_uses_schema_order() {
        let rows = synthetic_rows(3, 1);
        let dataset = Dataset::from_labeled(&rows);

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.features().ncols(), FEATURE_COUNT);
        assert!((dataset.features()[[1, 0]] - rows[1].reading.pm25).abs() < f64::EPSILON);
        assert!((dataset.features()[[1, 4]] - rows[1].reading.co).abs() < f64::EPSILON);
        assert!((dataset.targets()[2] - rows[2].aqi).abs() < f64::EPSILON);
    }

    #[test]
    fn test_new_rejects_bad_shapes() {
        assert!(Dataset::new(Array2::zeros((4, 5)), Array1::zeros(4)).is_err());
        assert!(Dataset::new(Array2::zeros((4, FEATURE_COUNT)), Array1::zeros(3)).is_err());
        assert!(Dataset::new(Array2::zeros((4, FEATURE_COUNT)), Array1::zeros(4)).is_ok());
    }

    #[test]
    fn test_split_sizes() {
        let dataset = Dataset::from_labeled(&synthetic_rows(101, 2));
        let (train, test) = dataset.train_test_split(0.2, 42).expect("split");

        assert_eq!(test.len(), 21);
        assert_eq!(train.len(), 80);
    }

    #[test]
    fn test_split_is_deterministic_per_seed() {
        let dataset = Dataset::from_labeled(&synthetic_rows(50, 3));

        let first = dataset.train_test_split(0.2, 42).expect("split");
        let second = dataset.train_test_split(0.2, 42).expect("split");
        assert_eq!(first, second);

        let other = dataset.train_test_split(0.2, 7).expect("split");
        assert_ne!(first.1, other.1);
    }

    #[test]
    fn test_split_partitions_every_row_once() {
        let dataset = Dataset::from_labeled(&synthetic_rows(40, 4));
        let (train, test) = dataset.train_test_split(0.25, 9).expect("split");

        let mut seen: Vec<f64> = train.targets().iter().chain(test.targets()).copied().collect();
        let mut expected: Vec<f64> = dataset.targets().to_vec();
        seen.sort_by(f64::total_cmp);
        expected.sort_by(f64::total_cmp);
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_split_rejects_degenerate_input() {
        let single = Dataset::from_labeled(&synthetic_rows(1, 5));
        assert!(single.train_test_split(0.2, 42).is_err());

        let dataset = Dataset::from_labeled(&synthetic_rows(10, 5));
        assert!(dataset.train_test_split(0.0, 42).is_err());
        assert!(dataset.train_test_split(1.0, 42).is_err());
    }
}
