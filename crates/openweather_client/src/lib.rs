//! Client for the OpenWeather geocoding and air pollution APIs.
//!
//! The HTTP layer depends on the [`AirQualityProvider`] trait rather than on
//! [`OpenWeatherClient`] directly, so tests can substitute a fake.

mod client;
mod models;

use air_quality_structs::{Coordinates, LiveAirQuality};
use async_trait::async_trait;
use thiserror::Error;

pub use client::OpenWeatherClient;
pub use models::{AirPollutionEntry, AirPollutionResponse, AqiIndex, Components, GeoLocation};

/// Errors returned by an air quality provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Geocoding returned no match for the city.
    #[error("City '{0}' not found")]
    CityNotFound(String),

    /// The upstream call failed, returned an error status, or sent a body
    /// that could not be decoded.
    #[error("Upstream provider error: {0}")]
    Upstream(String),
}

/// Source of live air quality for a named city.
#[async_trait]
pub trait AirQualityProvider: Send + Sync {
    /// Resolves a city name to coordinates using the first match.
    async fn geocode(&self, city: &str) -> Result<Coordinates, ProviderError>;

    /// Fetches the current pollutant readings at a location.
    async fn fetch_live_pollution(&self, coords: Coordinates) -> Result<LiveAirQuality, ProviderError>;
}
