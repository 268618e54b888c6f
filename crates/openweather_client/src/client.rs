//! HTTP client for OpenWeather.

use core::time::Duration;

use air_quality_structs::{Coordinates, LiveAirQuality};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::models::{AirPollutionResponse, GeoLocation};
use crate::{AirQualityProvider, ProviderError};

const GEOCODE_PATH: &str = "/geo/1.0/direct";
const AIR_POLLUTION_PATH: &str = "/data/2.5/air_pollution";

/// Client for the OpenWeather geocoding and air pollution endpoints.
///
/// Each call is a single request bounded by the configured timeout.
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{path}", self.base_url);
        debug!(path, "Calling OpenWeather");

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Upstream(format!("request to {path} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream(format!(
                "{path} returned status {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Upstream(format!("failed to parse {path} response: {e}")))
    }
}

#[async_trait]
impl AirQualityProvider for OpenWeatherClient {
    async fn geocode(&self, city: &str) -> Result<Coordinates, ProviderError> {
        let matches: Vec<GeoLocation> = self
            .get_json(GEOCODE_PATH, &[("q", city), ("limit", "1")])
            .await?;

        let location = matches
            .first()
            .ok_or_else(|| ProviderError::CityNotFound(city.to_string()))?;

        info!(city, resolved = %location.name, lat = location.lat, lon = location.lon, "Geocoded city");
        Ok(location.coordinates())
    }

    async fn fetch_live_pollution(&self, coords: Coordinates) -> Result<LiveAirQuality, ProviderError> {
        let lat = coords.lat.to_string();
        let lon = coords.lon.to_string();
        let response: AirPollutionResponse = self
            .get_json(AIR_POLLUTION_PATH, &[("lat", lat.as_str()), ("lon", lon.as_str())])
            .await?;

        response.into_live()
    }
}
