//! OpenWeather direct geocoding response and its normalization

use serde::Deserialize;

use crate::domain::{
    Coordinates, NormalizedGeolocation, Provider, UpstreamError, UpstreamErrorKind,
};

/// One match from `/geo/1.0/direct`
#[derive(Debug, Deserialize)]
struct GeocodingMatch {
    lat: f64,
    lon: f64,
    name: String,
    country: String,
}

/// Maps the first geocoding match to the dashboard shape, echoing the
/// submitted address. An empty match list is an upstream failure.
pub fn normalize_geolocation(
    address: &str,
    body: serde_json::Value,
) -> Result<NormalizedGeolocation, UpstreamError> {
    let matches: Vec<GeocodingMatch> = serde_json::from_value(body).map_err(|e| {
        UpstreamError::new(
            Provider::Geolocation,
            UpstreamErrorKind::InvalidResponse,
            format!("Failed to parse response: {}", e),
        )
    })?;

    let first = matches.into_iter().next().ok_or_else(|| {
        UpstreamError::new(
            Provider::Geolocation,
            UpstreamErrorKind::EmptyResult,
            format!("No location found for '{}'", address),
        )
    })?;

    Ok(NormalizedGeolocation {
        address: address.to_string(),
        coordinates: Coordinates::new(first.lat, first.lon),
        name: first.name,
        country: first.country,
    })
}
