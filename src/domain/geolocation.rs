//! Geolocation query validation and normalized shape

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::cache::CacheKeyParams;
use super::error::FetchError;
use super::fetch::Coordinates;

/// Resolved address as served to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedGeolocation {
    /// Address exactly as the caller submitted it
    pub address: String,
    pub coordinates: Coordinates,
    pub name: String,
    pub country: String,
}

/// Validated address lookup.
///
/// The address is used verbatim: "Berlin" and "berlin " are different
/// lookups with different cache entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeolocationQuery {
    address: String,
}

impl GeolocationQuery {
    pub fn new(address: impl Into<String>) -> Result<Self, FetchError> {
        let address = address.into();

        if address.is_empty() {
            return Err(FetchError::invalid_request("Address parameter required"));
        }

        Ok(Self { address })
    }

    pub fn from_parameters(parameters: &BTreeMap<String, String>) -> Result<Self, FetchError> {
        let address = parameters
            .get("address")
            .ok_or_else(|| FetchError::invalid_request("Address parameter required"))?;

        Self::new(address.as_str())
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn cache_params(&self) -> CacheKeyParams {
        CacheKeyParams::new().with_component("address", self.address.as_str())
    }
}
