use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use openweather_client::ProviderError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors a handler can return, each mapped to one HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("upstream provider failed: {0}")]
    Upstream(String),

    #[error("{message}: {source}")]
    Store {
        message: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl ApiError {
    /// Wraps a store failure with the message shown to the client.
    pub fn store(message: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Store { message, source }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::NotFound(message) | Self::Validation(message) => message.clone(),
            Self::Upstream(_) => "Failed to fetch data from the air quality provider".to_string(),
            Self::Store { message, .. } => (*message).to_string(),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::CityNotFound(_) => Self::NotFound("City not found".to_string()),
            ProviderError::Upstream(message) => Self::Upstream(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Upstream(_) | Self::Store { .. } => error!(error = %self, "Request failed"),
            Self::NotFound(_) | Self::Validation(_) => warn!(error = %self, "Request rejected"),
        }

        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}
