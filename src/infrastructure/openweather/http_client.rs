use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{FetchError, Provider, UpstreamError, UpstreamErrorKind};

/// Per-call bound applied to every upstream request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("api-dashboard/", env!("CARGO_PKG_VERSION"));

/// Failure of a raw HTTP exchange, before it is attributed to a provider
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HttpError {
    pub kind: UpstreamErrorKind,
    pub message: String,
}

impl HttpError {
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn for_provider(self, provider: Provider) -> FetchError {
        FetchError::Upstream(UpstreamError::new(provider, self.kind, self.message))
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            UpstreamErrorKind::Timeout
        } else if err.is_decode() {
            UpstreamErrorKind::InvalidResponse
        } else {
            UpstreamErrorKind::Transport
        };

        // The URL carries the API key as a query parameter
        Self::new(kind, err.without_url().to_string())
    }
}

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, HttpError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, HttpError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(HttpError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(HttpError::new(
                UpstreamErrorKind::Status(status.as_u16()),
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        response.json().await.map_err(|e| {
            let err = HttpError::from_reqwest(e);
            if err.kind == UpstreamErrorKind::Timeout {
                err
            } else {
                HttpError::new(
                    UpstreamErrorKind::InvalidResponse,
                    format!("Failed to parse response: {}", err.message),
                )
            }
        })
    }
}
