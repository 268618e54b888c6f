use std::path::Path;

use air_quality_structs::{AQI_MAX, AQI_MIN, PollutantReading};
use feature_extractor::{NormalizationOptions, extract_features};

use crate::{ArtifactError, ModelArtifact, TrainedModel, load_checkpoint};

/// Bounds a raw model output to the AQI scale. Non-finite values map to 0.
#[must_use]
pub fn clamp_aqi(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(AQI_MIN, AQI_MAX)
    } else {
        AQI_MIN
    }
}

/// Runs the full inference pipeline for a loaded model.
///
/// Read-only once built, so one instance can be shared across requests.
#[derive(Debug, Clone)]
pub struct AqiPredictor {
    model: TrainedModel,
    model_name: String,
    options: NormalizationOptions,
}

impl AqiPredictor {
    #[must_use]
    pub fn new(artifact: ModelArtifact, options: NormalizationOptions) -> Self {
        Self {
            model: artifact.model,
            model_name: artifact.model_name,
            options,
        }
    }

    /// Loads the artifact at `path` and builds a predictor from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact is missing, corrupt, or was trained
    /// with a different feature schema.
    pub fn from_path(path: &Path, options: NormalizationOptions) -> Result<Self, ArtifactError> {
        load_checkpoint(path).map(|artifact| Self::new(artifact, options))
    }

    /// Predicts the AQI for a raw reading with CO in µg/m³.
    ///
    /// The result is always within `[0, 500]`.
    #[must_use]
    pub fn predict(&self, reading: &PollutantReading) -> f64 {
        let features = extract_features(*reading, self.options);
        clamp_aqi(self.model.predict_one(&features))
    }

    /// Name recorded in the artifact at training time.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::LinearModel;

    fn linear(intercept: f64, coefficients: [f64; 6]) -> AqiPredictor {
        let artifact = ModelArtifact::new(
            "Linear_test",
            TrainedModel::Linear(LinearModel::new(intercept, coefficients.to_vec())),
        );
        AqiPredictor::new(artifact, NormalizationOptions::default())
    }

    #[test]
    fn test_clamp_aqi() {
        assert_eq!(clamp_aqi(-3.0), 0.0);
        assert_eq!(clamp_aqi(812.0), 500.0);
        assert_eq!(clamp_aqi(123.5), 123.5);
        assert_eq!(clamp_aqi(f64::NAN), 0.0);
        assert_eq!(clamp_aqi(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_pipeline_converts_co_before_inference() {
        // Only CO contributes, so the output exposes the converted value.
        let predictor = linear(0.0, [0.0, 0.0, 0.0, 0.0, 10.0, 0.0]);
        let reading = PollutantReading::new(40.0, 60.0, 20.0, 5.0, 400.0, 30.0);

        assert!((predictor.predict(&reading) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_reading_is_bounded() {
        let predictor = linear(0.0, [1e6; 6]);
        let reading = PollutantReading::new(1e9, 0.0, 0.0, 0.0, 0.0, 0.0);

        assert_eq!(predictor.predict(&reading), 500.0);
    }

    #[test]
    fn test_negative_output_is_floored() {
        let predictor = linear(-50.0, [0.0; 6]);
        assert_eq!(predictor.predict(&PollutantReading::default()), 0.0);
    }

    #[test]
    fn test_model_name_comes_from_artifact() {
        assert_eq!(linear(0.0, [0.0; 6]).model_name(), "Linear_test");
    }

    proptest! {
        #[test]
        fn prop_prediction_within_scale(
            pm25 in -1e6..1e9f64,
            pm10 in -1e6..1e9f64,
            co in -1e6..1e9f64,
            weight in -1e3..1e3f64,
        ) {
            let predictor = linear(7.0, [weight, -weight, weight, 1.0, weight, 1.0]);
            let reading = PollutantReading::new(pm25, pm10, 10.0, 10.0, co, 10.0);
            let aqi = predictor.predict(&reading);
            prop_assert!((0.0..=500.0).contains(&aqi));
        }
    }
}
