use serde::{Deserialize, Serialize};

/// Upper end of the AQI scale.
pub const AQI_MAX: f64 = 500.0;

/// Lower end of the AQI scale.
pub const AQI_MIN: f64 = 0.0;

/// Health band for an AQI value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum AqiCategory {
    Good,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    #[strum(to_string = "Very Poor")]
    VeryPoor,
    Severe,
}

impl AqiCategory {
    /// Maps an AQI value onto its health band.
    ///
    /// Values below the scale fall into `Good` and values above it into `Severe`.
    #[must_use]
    pub fn from_aqi(aqi: f64) -> Self {
        match aqi {
            v if v <= 50.0 => Self::Good,
            v if v <= 100.0 => Self::Moderate,
            v if v <= 200.0 => Self::Poor,
            v if v <= 300.0 => Self::VeryPoor,
            _ => Self::Severe,
        }
    }
}
