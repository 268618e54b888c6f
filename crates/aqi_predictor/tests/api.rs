//! HTTP API tests against fake provider and store implementations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use air_quality_structs::{Coordinates, CreatePrediction, LiveAirQuality, PollutantReading, PredictionRecord};
use aqi_predictor::server::{AppState, PredictionHistory, ServiceSettings, build_router};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{DateTime, Duration, TimeZone, Utc};
use feature_extractor::NormalizationOptions;
use http_body_util::BodyExt;
use ml_model::{AqiPredictor, LinearModel, ModelArtifact, TrainedModel};
use openweather_client::{AirQualityProvider, ProviderError};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

const ORIGIN: &str = "https://dashboard.example.com";

#[derive(Default)]
struct FakeProvider {
    geocode_calls: AtomicUsize,
    pollution_calls: AtomicUsize,
}

#[async_trait]
impl AirQualityProvider for FakeProvider {
    async fn geocode(&self, city: &str) -> Result<Coordinates, ProviderError> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        match city {
            "Delhi" => Ok(Coordinates { lat: 28.65, lon: 77.22 }),
            "Unstable" => Ok(Coordinates { lat: 0.0, lon: 0.0 }),
            _ => Err(ProviderError::CityNotFound(city.to_string())),
        }
    }

    async fn fetch_live_pollution(&self, coords: Coordinates) -> Result<LiveAirQuality, ProviderError> {
        self.pollution_calls.fetch_add(1, Ordering::SeqCst);
        if coords.lat == 0.0 {
            return Err(ProviderError::Upstream("connection reset".to_string()));
        }
        Ok(LiveAirQuality {
            reading: PollutantReading::new(84.2, 121.9, 35.6, 12.4, 1121.5, 61.5),
            api_aqi: 4,
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid"),
        })
    }
}

#[derive(Default)]
struct FakeHistory {
    records: Mutex<Vec<PredictionRecord>>,
    writes: AtomicUsize,
    fail: bool,
}

impl FakeHistory {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn with_records(city: &str, times: &[DateTime<Utc>]) -> Self {
        let records = times
            .iter()
            .enumerate()
            .map(|(i, time)| PredictionRecord {
                id: Uuid::new_v4(),
                city: city.to_string(),
                prediction_time: *time,
                predicted_aqi: 100.0 + f64::from(u32::try_from(i).expect("small")),
                model_name: "RandomForest_v1".to_string(),
            })
            .collect();
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.fail {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PredictionHistory for FakeHistory {
    async fn record(&self, prediction: CreatePrediction) -> Result<(), sqlx::Error> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records.lock().expect("lock").push(PredictionRecord {
            id: Uuid::new_v4(),
            city: prediction.city,
            prediction_time: prediction.prediction_time,
            predicted_aqi: prediction.predicted_aqi,
            model_name: prediction.model_name,
        });
        Ok(())
    }

    async fn latest(&self, city: &str) -> Result<Option<PredictionRecord>, sqlx::Error> {
        Ok(self.recent(city, 1).await?.into_iter().next())
    }

    async fn recent(&self, city: &str, limit: u32) -> Result<Vec<PredictionRecord>, sqlx::Error> {
        self.check()?;
        let mut rows: Vec<_> = self
            .records
            .lock()
            .expect("lock")
            .iter()
            .filter(|record| record.city == city)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.prediction_time.cmp(&a.prediction_time));
        rows.truncate(usize::try_from(limit).expect("fits"));
        Ok(rows)
    }
}

struct TestApp {
    router: Router,
    provider: Arc<FakeProvider>,
    history: Arc<FakeHistory>,
}

fn predictor() -> AqiPredictor {
    let model = LinearModel::new(5.0, vec![0.8, 0.3, 0.2, 0.1, 5.0, 0.15]);
    let artifact = ModelArtifact::new("RandomForest_v1", TrainedModel::Linear(model));
    AqiPredictor::new(artifact, NormalizationOptions::default())
}

fn app_with(history: FakeHistory, persist_predictions: bool) -> TestApp {
    let provider = Arc::new(FakeProvider::default());
    let history = Arc::new(history);
    let state = AppState::new(
        predictor(),
        provider.clone(),
        history.clone(),
        ServiceSettings {
            model_name: "RandomForest_v1".to_string(),
            persist_predictions,
        },
    );
    let router = build_router(state, &format!("{ORIGIN}/")).expect("router");
    TestApp {
        router,
        provider,
        history,
    }
}

fn app() -> TestApp {
    app_with(FakeHistory::default(), false)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::get(uri).body(Body::empty()).expect("request")).await
}

async fn post_json(router: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(router, request).await
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(&app().router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "OK"}));
}

#[tokio::test]
async fn test_manual_prediction_for_testville() {
    let app = app();
    let (status, body) = post_json(
        &app.router,
        "/predict",
        &json!({"city": "Testville", "pm25": 50, "pm10": 80, "no2": 20, "so2": 10, "co": 1000, "o3": 30}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Testville");
    assert_eq!(body["mode"], "manual_test");
    assert_eq!(body["model"], "RandomForest_v1");
    let aqi = body["predicted_aqi"].as_f64().expect("number");
    assert!((0.0..=500.0).contains(&aqi));
    // 5 + 40 + 24 + 4 + 1 + 5 + 4.5
    assert!((aqi - 83.5).abs() < 1e-9);
    assert_eq!(body["category"], "Moderate");
    assert_eq!(app.history.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_manual_prediction_is_bounded() {
    let (status, body) = post_json(
        &app().router,
        "/predict",
        &json!({"city": "X", "pm25": 1e9, "pm10": 0, "no2": 0, "so2": 0, "co": 0, "o3": 0}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["predicted_aqi"].as_f64().expect("number") <= 500.0);
}

#[tokio::test]
async fn test_manual_prediction_validation() {
    let router = app().router;

    let (status, body) = post_json(&router, "/predict", &json!({"city": "Testville", "pm25": 50})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());

    let (status, _) = post_json(
        &router,
        "/predict",
        &json!({"city": "  ", "pm25": 1, "pm10": 1, "no2": 1, "so2": 1, "co": 1, "o3": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post_json(
        &router,
        "/predict",
        &json!({"city": "X", "pm25": "high", "pm10": 1, "no2": 1, "so2": 1, "co": 1, "o3": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_city_prediction() {
    let app = app_with(FakeHistory::default(), true);
    let (status, body) = get(&app.router, "/predict/city?city=Delhi").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Delhi");
    assert_eq!(body["real_time_aqi_api"], 4);
    assert_eq!(body["source"], "OpenWeather + ML");
    assert_eq!(body["pollutants"]["co"], 1121.5);
    assert_eq!(body["timestamp"], "2023-11-14T22:13:20Z");
    let aqi = body["predicted_aqi_ml"].as_f64().expect("number");
    assert!((0.0..=500.0).contains(&aqi));
    assert_eq!(app.history.writes.load(Ordering::SeqCst), 1);

    let (status, latest) = get(&app.router, "/analytics/latest?city=Delhi").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["model"], "RandomForest_v1");
}

#[tokio::test]
async fn test_city_prediction_without_persistence() {
    let app = app();
    let (status, _) = get(&app.router, "/predict/city?city=Delhi").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.history.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_city_has_no_side_effects() {
    let app = app_with(FakeHistory::default(), true);
    let (status, body) = get(&app.router, "/predict/city?city=Atlantis").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "City not found");
    assert_eq!(app.provider.geocode_calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.provider.pollution_calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.history.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let app = app_with(FakeHistory::default(), true);
    let (status, body) = get(&app.router, "/predict/city?city=Unstable").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!body["detail"].as_str().expect("detail").contains("connection reset"));
    assert_eq!(app.history.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_store_failure_when_persisting() {
    let app = app_with(FakeHistory::failing(), true);
    let (status, _) = get(&app.router, "/predict/city?city=Delhi").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_missing_city_parameter() {
    let (status, body) = get(&app().router, "/predict/city").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_current_aqi() {
    let (status, body) = get(&app().router, "/aqi/current?city=Delhi").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["aqi_source"], "OpenWeather");
    assert_eq!(body["aqi_scale"], "1-5");
    assert_eq!(body["current_aqi"], 4);
    assert_eq!(body["pollutants"]["pm25"], 84.2);

    let (status, _) = get(&app().router, "/aqi/current?city=Atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_latest_not_found() {
    let (status, body) = get(&app().router, "/analytics/latest?city=Delhi").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No data found");
}

#[tokio::test]
async fn test_trend_is_ascending() {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().expect("valid");
    let times: Vec<_> = (0..15).map(|h| base + Duration::hours(h)).collect();
    let app = app_with(FakeHistory::with_records("Delhi", &times), false);

    let (status, body) = get(&app.router, "/analytics/trend?city=Delhi").await;
    assert_eq!(status, StatusCode::OK);

    let points = body.as_array().expect("array");
    assert_eq!(points.len(), 10);
    let parsed: Vec<DateTime<Utc>> = points
        .iter()
        .map(|p| p["time"].as_str().expect("time").parse().expect("rfc3339"))
        .collect();
    assert!(parsed.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(parsed.last(), times.last());
    assert_eq!(parsed.first(), times.get(5));

    let (_, body) = get(&app.router, "/analytics/trend?city=Delhi&limit=3").await;
    assert_eq!(body.as_array().expect("array").len(), 3);
}

#[tokio::test]
async fn test_trend_empty_for_unknown_city() {
    let (status, body) = get(&app().router, "/analytics/trend?city=Nowhere").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_trend_store_failure() {
    let app = app_with(FakeHistory::failing(), false);
    let (status, body) = get(&app.router, "/analytics/trend?city=Delhi").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Failed to fetch trend data");
}

#[tokio::test]
async fn test_trend_limit_validation() {
    let router = app().router;
    for uri in [
        "/analytics/trend?city=Delhi&limit=0",
        "/analytics/trend?city=Delhi&limit=1001",
        "/analytics/trend?city=Delhi&limit=-1",
        "/analytics/trend?city=Delhi&limit=ten",
    ] {
        let (status, _) = get(&router, uri).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
    }
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let request = Request::get("/health")
        .header(header::ORIGIN, ORIGIN)
        .body(Body::empty())
        .expect("request");
    let response = app().router.oneshot(request).await.expect("response");

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some(ORIGIN)
    );
}
