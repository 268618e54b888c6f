//! API response types for OpenWeather.

use air_quality_structs::{Coordinates, LiveAirQuality, PollutantReading};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::ProviderError;

/// One match from GET /geo/1.0/direct.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
    pub state: Option<String>,
}

impl GeoLocation {
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// Response from GET /data/2.5/air_pollution.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AirPollutionResponse {
    pub list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AirPollutionEntry {
    pub main: AqiIndex,
    pub components: Components,
    /// Measurement time in unix seconds
    pub dt: i64,
}

/// Provider AQI on the 1 (good) to 5 (very poor) scale.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct AqiIndex {
    pub aqi: u8,
}

/// Pollutant concentrations in µg/m³.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Components {
    pub co: f64,
    pub no: Option<f64>,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: Option<f64>,
}

impl AirPollutionResponse {
    /// Converts the first entry into live readings.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or the timestamp is out of range.
    pub fn into_live(self) -> Result<LiveAirQuality, ProviderError> {
        let entry = self
            .list
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Upstream("air pollution response has no entries".into()))?;
        entry.into_live()
    }
}

impl AirPollutionEntry {
    /// Converts this entry into live readings.
    ///
    /// # Errors
    ///
    /// Returns an error if `dt` is not a representable timestamp.
    pub fn into_live(self) -> Result<LiveAirQuality, ProviderError> {
        let timestamp = DateTime::from_timestamp(self.dt, 0)
            .ok_or_else(|| ProviderError::Upstream(format!("invalid measurement time {}", self.dt)))?;
        let c = self.components;

        Ok(LiveAirQuality {
            reading: PollutantReading::new(c.pm2_5, c.pm10, c.no2, c.so2, c.co, c.o3),
            api_aqi: self.main.aqi,
            timestamp,
        })
    }
}
