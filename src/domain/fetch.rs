//! Fetch request and normalized payload types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::geolocation::NormalizedGeolocation;
use super::provider::Provider;
use super::weather::NormalizedWeather;

/// A single request for provider data. Built once per call and never mutated
/// after it is handed to the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    provider: Provider,
    parameters: BTreeMap<String, String>,
}

impl FetchRequest {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameters<K, V, I>(provider: Provider, parameters: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            provider,
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Weather request for the default location
    pub fn weather() -> Self {
        Self::new(Provider::Weather)
    }

    pub fn weather_at(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self::weather().with_param("lat", lat).with_param("lon", lon)
    }

    pub fn geolocation(address: impl Into<String>) -> Self {
        Self::new(Provider::Geolocation).with_param("address", address)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// Geographic position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Normalized result of a fetch, serialized without a wrapper tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedPayload {
    Weather(NormalizedWeather),
    Geolocation(NormalizedGeolocation),
}

impl NormalizedPayload {
    pub fn provider(&self) -> Provider {
        match self {
            Self::Weather(_) => Provider::Weather,
            Self::Geolocation(_) => Provider::Geolocation,
        }
    }
}
