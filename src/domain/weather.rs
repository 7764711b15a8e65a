//! Weather query validation, normalized shape and icon glyphs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::cache::CacheKeyParams;
use super::error::FetchError;
use super::fetch::Coordinates;

/// Latitude used when the caller does not pass one (Berlin)
pub const DEFAULT_LAT: &str = "52.5200";
/// Longitude used when the caller does not pass one (Berlin)
pub const DEFAULT_LON: &str = "13.4050";

/// Glyph for icon codes missing from the table
pub const DEFAULT_ICON: &str = "🌤️";

/// Current conditions as served to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWeather {
    #[serde(rename = "location")]
    pub location_name: String,
    /// Whole degrees, rounded before the value is cached
    #[serde(rename = "temperature")]
    pub temperature_celsius: i64,
    #[serde(rename = "condition")]
    pub condition_description: String,
    #[serde(rename = "icon")]
    pub icon_glyph: String,
    /// Whole percent, as OpenWeather reports it
    #[serde(rename = "humidity")]
    pub humidity_percent: u8,
    pub wind_speed: f64,
    pub coordinates: Coordinates,
}

/// Validated weather lookup. Keeps the caller's raw strings so the cache key
/// reflects exactly what was asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    lat: String,
    lon: String,
}

impl WeatherQuery {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Result<Self, FetchError> {
        let lat = lat.into();
        let lon = lon.into();

        parse_coordinate("lat", &lat)?;
        parse_coordinate("lon", &lon)?;

        Ok(Self { lat, lon })
    }

    /// Builds the query from request parameters, falling back to the default location
    pub fn from_parameters(parameters: &BTreeMap<String, String>) -> Result<Self, FetchError> {
        let lat = parameters.get("lat").map_or(DEFAULT_LAT, String::as_str);
        let lon = parameters.get("lon").map_or(DEFAULT_LON, String::as_str);

        Self::new(lat, lon)
    }

    pub fn lat(&self) -> &str {
        &self.lat
    }

    pub fn lon(&self) -> &str {
        &self.lon
    }

    pub fn cache_params(&self) -> CacheKeyParams {
        CacheKeyParams::new()
            .with_component("lat", self.lat.as_str())
            .with_component("lon", self.lon.as_str())
    }
}

impl Default for WeatherQuery {
    fn default() -> Self {
        Self {
            lat: DEFAULT_LAT.to_string(),
            lon: DEFAULT_LON.to_string(),
        }
    }
}

fn parse_coordinate(name: &str, value: &str) -> Result<f64, FetchError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            FetchError::invalid_request(format!("Parameter '{}' must be a number, got '{}'", name, value))
        })
}

/// Maps an OpenWeather icon code (e.g. "01d", "10n") to a display glyph
pub fn icon_glyph(code: &str) -> &'static str {
    match code {
        "01d" => "☀️",
        "01n" => "🌙",
        "02d" => "⛅",
        "02n" | "03d" | "03n" | "04d" | "04n" => "☁️",
        "09d" | "09n" | "10n" => "🌧️",
        "10d" => "🌦️",
        "11d" | "11n" => "⛈️",
        "13d" | "13n" => "❄️",
        "50d" | "50n" => "🌫️",
        _ => DEFAULT_ICON,
    }
}
