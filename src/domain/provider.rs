//! Upstream data providers known to the dashboard

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of providers the fetch layer can resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Weather,
    Geolocation,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Weather, Provider::Geolocation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Geolocation => "geolocation",
        }
    }

    /// How long a successful response stays fresh in the cache
    pub fn default_ttl(&self) -> Duration {
        match self {
            Self::Weather => Duration::from_secs(600),
            Self::Geolocation => Duration::from_secs(3600),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider name that does not match any known provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weather" => Ok(Self::Weather),
            "geolocation" => Ok(Self::Geolocation),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}
