use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Error metrics for a regressor on a held-out set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    /// Compares predictions against the true targets.
    ///
    /// When the targets have zero variance, R² is 1 for a perfect fit and
    /// 0 otherwise. Empty input yields all zeros.
    #[must_use]
    pub fn evaluate(actual: &Array1<f64>, predicted: &Array1<f64>) -> Self {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return Self {
                mae: 0.0,
                rmse: 0.0,
                r2: 0.0,
            };
        }

        #[expect(clippy::cast_precision_loss, reason = "row counts fit in f64")]
        let count = n as f64;
        let pairs = || actual.iter().zip(predicted.iter()).take(n);

        let mae = pairs().map(|(a, p)| (a - p).abs()).sum::<f64>() / count;
        let sse: f64 = pairs().map(|(a, p)| (a - p).powi(2)).sum();
        let rmse = (sse / count).sqrt();

        let mean = pairs().map(|(a, _)| a).sum::<f64>() / count;
        let sst: f64 = pairs().map(|(a, _)| (a - mean).powi(2)).sum();
        let r2 = if sst > 0.0 {
            1.0 - sse / sst
        } else if sse == 0.0 {
            1.0
        } else {
            0.0
        };

        Self { mae, rmse, r2 }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let y = array![1.0, 2.0, 3.0];
        let metrics = RegressionMetrics::evaluate(&y, &y);
        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.rmse, 0.0);
        assert!((metrics.r2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_known_values() {
        let actual = array![1.0, 2.0, 3.0, 4.0];
        let predicted = array![2.0, 2.0, 3.0, 2.0];
        let metrics = RegressionMetrics::evaluate(&actual, &predicted);

        // errors: 1, 0, 0, 2; sse = 5; sst = 5
        assert!((metrics.mae - 0.75).abs() < 1e-12);
        assert!((metrics.rmse - 1.25_f64.sqrt()).abs() < 1e-12);
        assert!(metrics.r2.abs() < 1e-12);
    }

    #[test]
    fn test_constant_targets() {
        let actual = array![5.0, 5.0];
        assert!((RegressionMetrics::evaluate(&actual, &array![5.0, 5.0]).r2 - 1.0).abs() < 1e-12);
        assert_eq!(RegressionMetrics::evaluate(&actual, &array![4.0, 6.0]).r2, 0.0);
    }
}
