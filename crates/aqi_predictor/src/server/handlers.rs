//! Request handlers for the HTTP API.

use air_quality_structs::{AqiCategory, CreatePrediction, LiveAirQuality, PollutantReading};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::ApiError;
use super::state::AppState;

const DEFAULT_TREND_LIMIT: u32 = 10;
const MAX_TREND_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: String,
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub city: String,
    pub limit: Option<u32>,
}

/// Body of `POST /predict`.
#[derive(Debug, Deserialize)]
pub struct ManualPredictionRequest {
    pub city: String,
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
    pub o3: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CityPredictionResponse {
    pub city: String,
    pub real_time_aqi_api: u8,
    pub predicted_aqi_ml: f64,
    pub category: AqiCategory,
    pub pollutants: PollutantReading,
    pub model: String,
    pub source: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ManualPredictionResponse {
    pub city: String,
    pub predicted_aqi: f64,
    pub category: AqiCategory,
    pub model: String,
    pub mode: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LatestPredictionResponse {
    pub city: String,
    pub predicted_aqi: f64,
    pub prediction_time: DateTime<Utc>,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct TrendPoint {
    pub aqi: f64,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CurrentAqiResponse {
    pub city: String,
    pub aqi_source: &'static str,
    pub aqi_scale: &'static str,
    pub current_aqi: u8,
    pub pollutants: PollutantReading,
    pub timestamp: DateTime<Utc>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn require_city(city: &str) -> Result<&str, ApiError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(ApiError::Validation("city must not be blank".to_string()));
    }
    Ok(city)
}

/// Geocodes first, so an unknown city fails before any other work.
async fn fetch_live(state: &AppState, city: &str) -> Result<LiveAirQuality, ApiError> {
    let coords = state.provider.geocode(city).await?;
    Ok(state.provider.fetch_live_pollution(coords).await?)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "OK" })
}

/// `GET /predict/city`: live readings plus the model's prediction.
pub async fn predict_city(
    State(state): State<AppState>,
    query: Result<Query<CityQuery>, QueryRejection>,
) -> Result<Json<CityPredictionResponse>, ApiError> {
    let Query(query) = query?;
    let city = require_city(&query.city)?;

    let live = fetch_live(&state, city).await?;
    let predicted = state.predictor.predict(&live.reading);
    info!(city, predicted_aqi = predicted, api_aqi = live.api_aqi, "Predicted city AQI");

    if state.settings.persist_predictions {
        state
            .history
            .record(CreatePrediction {
                city: city.to_string(),
                prediction_time: Utc::now(),
                predicted_aqi: predicted,
                model_name: state.settings.model_name.clone(),
            })
            .await
            .map_err(ApiError::store("Failed to store prediction"))?;
    }

    Ok(Json(CityPredictionResponse {
        city: city.to_string(),
        real_time_aqi_api: live.api_aqi,
        predicted_aqi_ml: round2(predicted),
        category: AqiCategory::from_aqi(predicted),
        pollutants: live.reading,
        model: state.settings.model_name.clone(),
        source: "OpenWeather + ML",
        timestamp: live.timestamp,
    }))
}

/// `POST /predict`: prediction from caller-supplied readings. Never stored.
pub async fn predict_manual(
    State(state): State<AppState>,
    body: Result<Json<ManualPredictionRequest>, JsonRejection>,
) -> Result<Json<ManualPredictionResponse>, ApiError> {
    let Json(body) = body?;
    let city = require_city(&body.city)?;

    let reading = PollutantReading::new(body.pm25, body.pm10, body.no2, body.so2, body.co, body.o3);
    if let Some(field) = reading.first_non_finite() {
        return Err(ApiError::Validation(format!("{field} must be a finite number")));
    }

    let predicted = state.predictor.predict(&reading);
    debug!(city, predicted_aqi = predicted, "Manual prediction");

    Ok(Json(ManualPredictionResponse {
        city: city.to_string(),
        predicted_aqi: round2(predicted),
        category: AqiCategory::from_aqi(predicted),
        model: state.settings.model_name.clone(),
        mode: "manual_test",
    }))
}

/// `GET /analytics/latest`: most recent stored prediction for a city.
pub async fn latest_prediction(
    State(state): State<AppState>,
    query: Result<Query<CityQuery>, QueryRejection>,
) -> Result<Json<LatestPredictionResponse>, ApiError> {
    let Query(query) = query?;
    let city = require_city(&query.city)?;

    let record = state
        .history
        .latest(city)
        .await
        .map_err(ApiError::store("Failed to fetch latest prediction"))?
        .ok_or_else(|| ApiError::NotFound("No data found".to_string()))?;

    Ok(Json(LatestPredictionResponse {
        city: city.to_string(),
        predicted_aqi: record.predicted_aqi,
        prediction_time: record.prediction_time,
        model: record.model_name,
    }))
}

/// `GET /analytics/trend`: recent predictions, oldest first.
pub async fn prediction_trend(
    State(state): State<AppState>,
    query: Result<Query<TrendQuery>, QueryRejection>,
) -> Result<Json<Vec<TrendPoint>>, ApiError> {
    let Query(query) = query?;
    let city = require_city(&query.city)?;

    let limit = query.limit.unwrap_or(DEFAULT_TREND_LIMIT);
    if !(1..=MAX_TREND_LIMIT).contains(&limit) {
        return Err(ApiError::Validation(format!(
            "limit must be between 1 and {MAX_TREND_LIMIT}"
        )));
    }

    let mut records = state
        .history
        .recent(city, limit)
        .await
        .map_err(ApiError::store("Failed to fetch trend data"))?;
    records.sort_by_key(|record| record.prediction_time);

    Ok(Json(
        records
            .into_iter()
            .map(|record| TrendPoint {
                aqi: record.predicted_aqi,
                time: record.prediction_time,
            })
            .collect(),
    ))
}

/// `GET /aqi/current`: the provider's own AQI without the model.
pub async fn current_aqi(
    State(state): State<AppState>,
    query: Result<Query<CityQuery>, QueryRejection>,
) -> Result<Json<CurrentAqiResponse>, ApiError> {
    let Query(query) = query?;
    let city = require_city(&query.city)?;

    let live = fetch_live(&state, city).await?;

    Ok(Json(CurrentAqiResponse {
        city: city.to_string(),
        aqi_source: "OpenWeather",
        aqi_scale: "1-5",
        current_aqi: live.api_aqi,
        pollutants: live.reading,
        timestamp: live.timestamp,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert!((round2(123.456) - 123.46).abs() < 1e-9);
        assert!((round2(0.004) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_require_city() {
        assert_eq!(require_city("  Delhi ").expect("city"), "Delhi");
        assert!(matches!(require_city("   "), Err(ApiError::Validation(_))));
    }
}
