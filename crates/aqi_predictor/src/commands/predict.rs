//! Predict command - runs inference on a single reading from the command line.

use std::path::Path;

use air_quality_structs::{AqiCategory, PollutantReading};
use anyhow::{Context, Result};
use feature_extractor::NormalizationOptions;
use ml_model::AqiPredictor;
use tracing::info;

/// Runs the predict command and returns the predicted AQI.
///
/// # Errors
///
/// Returns an error if the model cannot be loaded or the reading is not finite.
pub fn run(model_path: &Path, reading: &PollutantReading, options: NormalizationOptions) -> Result<f64> {
    if let Some(field) = reading.first_non_finite() {
        anyhow::bail!("{field} must be a finite number");
    }

    let predictor = AqiPredictor::from_path(model_path, options)
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;

    let aqi = predictor.predict(reading);
    let category = AqiCategory::from_aqi(aqi);

    info!(
        model = predictor.model_name(),
        predicted_aqi = aqi,
        %category,
        "Prediction"
    );

    Ok(aqi)
}
