//! Ordinary least squares baseline, fitted through linfa.

use anyhow::{Result, anyhow, ensure};
use linfa::traits::Fit;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::Dataset;

/// Linear model `intercept + coefficients . x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearModel {
    #[must_use]
    pub const fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }

    /// Fits an OLS regression with intercept on every row of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset is empty or the normal equations
    /// cannot be solved.
    pub fn fit(dataset: &Dataset) -> Result<Self> {
        ensure!(!dataset.is_empty(), "cannot fit a linear model on an empty dataset");

        let records = linfa::Dataset::new(dataset.features().clone(), dataset.targets().clone());
        let fitted = LinearRegression::new()
            .fit(&records)
            .map_err(|e| anyhow!("linear regression failed: {e}"))?;

        Ok(Self {
            intercept: fitted.intercept(),
            coefficients: fitted.params().to_vec(),
        })
    }

    #[must_use]
    pub fn predict_one(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    #[must_use]
    pub fn predict(&self, features: &Array2<f64>) -> Array1<f64> {
        features
            .rows()
            .into_iter()
            .map(|row| self.predict_one(&row.to_vec()))
            .collect()
    }

    #[must_use]
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }

    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}
