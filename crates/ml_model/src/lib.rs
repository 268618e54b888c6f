//! ML model crate for AQI prediction.
//!
//! This crate defines the regressors used by the service, the routine that
//! trains and compares them, the compressed artifact format the serving
//! process loads at startup, and the predictor that turns a raw pollutant
//! reading into a bounded AQI value.

mod checkpoint;
mod dataset;
mod forest;
mod linear;
mod metrics;
mod predictor;
mod training;
mod tree;

pub use checkpoint::{ArtifactError, ModelArtifact, TrainedModel, load_checkpoint, save_checkpoint};
pub use dataset::Dataset;
pub use forest::{ForestConfig, RandomForestRegressor};
pub use linear::LinearModel;
pub use metrics::RegressionMetrics;
pub use predictor::{AqiPredictor, clamp_aqi};
pub use training::{TrainingConfig, TrainingOutput, train_and_evaluate};
pub use tree::{RegressionTree, TreeConfig};
