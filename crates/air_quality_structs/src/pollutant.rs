use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Concentrations of the six pollutants the model is trained on.
///
/// `co` is in µg/m³ as reported by the live provider and in mg/m³ once it
/// has been through unit conversion. Every other field is µg/m³.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PollutantReading {
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
    pub o3: f64,
}

impl PollutantReading {
    #[must_use]
    pub const fn new(pm25: f64, pm10: f64, no2: f64, so2: f64, co: f64, o3: f64) -> Self {
        Self {
            pm25,
            pm10,
            no2,
            so2,
            co,
            o3,
        }
    }

    /// Returns the name of the first field holding `NaN` or an infinity.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("pm25", self.pm25),
            ("pm10", self.pm10),
            ("no2", self.no2),
            ("so2", self.so2),
            ("co", self.co),
            ("o3", self.o3),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
    }
}

/// A latitude/longitude pair resolved from a city name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Live conditions fetched from the weather provider for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveAirQuality {
    /// Raw pollutant concentrations (`co` in µg/m³).
    pub reading: PollutantReading,
    /// Provider-native AQI on its 1-5 scale.
    pub api_aqi: u8,
    /// Measurement time reported by the provider.
    pub timestamp: DateTime<Utc>,
}
