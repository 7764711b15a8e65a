//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::{FetchError, UnknownProvider};

/// Error body shared by every route: `{"error": "<message>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            error: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        let status = match &err {
            FetchError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            FetchError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            FetchError::Upstream(upstream) if upstream.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            FetchError::Upstream(_) => StatusCode::BAD_GATEWAY,
            FetchError::Cache { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match err {
            FetchError::Configuration { message }
            | FetchError::InvalidRequest { message }
            | FetchError::Cache { message } => message,
            FetchError::Upstream(upstream) => upstream.to_string(),
        };

        Self::new(status, message)
    }
}

impl From<UnknownProvider> for ApiError {
    fn from(_: UnknownProvider) -> Self {
        Self::not_found("Provider not found")
    }
}
