//! HTTP API for live and manual AQI predictions.

mod error;
mod handlers;
mod state;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

pub use error::ApiError;
pub use state::{AppState, PgPredictionHistory, PredictionHistory, ServiceSettings};

/// Builds the router with every endpoint and the CORS layer.
///
/// # Errors
///
/// Returns an error if `cors_origin` is not a valid header value.
pub fn build_router(state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = HeaderValue::from_str(cors_origin.trim_end_matches('/'))
        .with_context(|| format!("Invalid CORS origin: {cors_origin}"))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/health", get(handlers::health))
        .route("/predict/city", get(handlers::predict_city))
        .route("/predict", post(handlers::predict_manual))
        .route("/analytics/latest", get(handlers::latest_prediction))
        .route("/analytics/trend", get(handlers::prediction_trend))
        .route("/aqi/current", get(handlers::current_aqi))
        .layer(cors)
        .with_state(state))
}

/// Serves the router until Ctrl-C is received.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(router: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl-C, running until killed");
            core::future::pending::<()>().await;
        }
    }
}
