//! OpenWeather current-conditions response and its normalization

use serde::Deserialize;

use crate::domain::{
    icon_glyph, Coordinates, NormalizedWeather, Provider, UpstreamError, UpstreamErrorKind,
};

/// Current weather response from OpenWeather (`/data/2.5/weather`)
#[derive(Debug, Deserialize)]
struct OpenWeatherResponse {
    name: String,
    main: MainSection,
    weather: Vec<ConditionSection>,
    wind: WindSection,
    coord: CoordSection,
}

#[derive(Debug, Deserialize)]
struct MainSection {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionSection {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WindSection {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct CoordSection {
    lat: f64,
    lon: f64,
}

/// Maps a raw OpenWeather body to the dashboard shape.
///
/// Temperature is rounded half away from zero; the icon code goes through
/// the glyph table. Pure and deterministic.
pub fn normalize_weather(body: serde_json::Value) -> Result<NormalizedWeather, UpstreamError> {
    let raw: OpenWeatherResponse = serde_json::from_value(body).map_err(|e| {
        UpstreamError::new(
            Provider::Weather,
            UpstreamErrorKind::InvalidResponse,
            format!("Failed to parse response: {}", e),
        )
    })?;

    let condition = raw.weather.into_iter().next().ok_or_else(|| {
        UpstreamError::new(
            Provider::Weather,
            UpstreamErrorKind::InvalidResponse,
            "No weather conditions in response",
        )
    })?;

    Ok(NormalizedWeather {
        location_name: raw.name,
        temperature_celsius: raw.main.temp.round() as i64,
        icon_glyph: icon_glyph(&condition.icon).to_string(),
        condition_description: condition.description,
        humidity_percent: raw.main.humidity.round().clamp(0.0, 100.0) as u8,
        wind_speed: raw.wind.speed,
        coordinates: Coordinates::new(raw.coord.lat, raw.coord.lon),
    })
}
