use std::fmt;

use thiserror::Error;

use super::provider::Provider;

/// Errors returned by the external data fetch layer
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl FetchError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn upstream(provider: Provider, kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self::Upstream(UpstreamError::new(provider, kind, message))
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}

/// What went wrong while talking to an upstream provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// Upstream answered with a non-success HTTP status
    Status(u16),
    /// Request exceeded the client timeout
    Timeout,
    /// Connection, DNS or TLS failure
    Transport,
    /// Body could not be decoded into the expected shape
    InvalidResponse,
    /// Upstream answered successfully but with no usable result
    EmptyResult,
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "status {}", code),
            Self::Timeout => write!(f, "timeout"),
            Self::Transport => write!(f, "transport"),
            Self::InvalidResponse => write!(f, "invalid response"),
            Self::EmptyResult => write!(f, "empty result"),
        }
    }
}

/// Failure of a single upstream call
#[derive(Debug, Clone, Error)]
#[error("Upstream error: {provider} ({kind}) - {message}")]
pub struct UpstreamError {
    pub provider: Provider,
    pub kind: UpstreamErrorKind,
    pub message: String,
}

impl UpstreamError {
    pub fn new(provider: Provider, kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == UpstreamErrorKind::Timeout
    }
}
