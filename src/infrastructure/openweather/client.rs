use std::sync::Arc;

use tracing::debug;

use super::geocoding::normalize_geolocation;
use super::http_client::HttpClientTrait;
use super::weather::normalize_weather;
use crate::domain::{
    FetchError, GeolocationQuery, NormalizedGeolocation, NormalizedWeather, Provider,
    WeatherQuery,
};

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
pub const DEFAULT_LOCALE: &str = "de";

/// Endpoints and request options for OpenWeather
#[derive(Debug, Clone)]
pub struct OpenWeatherEndpoints {
    pub weather_url: String,
    pub geocoding_url: String,
    /// Language of the condition description text
    pub locale: String,
}

impl Default for OpenWeatherEndpoints {
    fn default() -> Self {
        Self {
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl OpenWeatherEndpoints {
    /// Points both endpoints at one host, keeping OpenWeather's paths
    pub fn with_base_url(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');

        Self {
            weather_url: format!("{}/data/2.5/weather", base_url),
            geocoding_url: format!("{}/geo/1.0/direct", base_url),
            ..Self::default()
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

/// Performs single OpenWeather calls and normalizes their results.
/// Never caches and never retries.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Arc<dyn HttpClientTrait>,
    endpoints: OpenWeatherEndpoints,
}

impl OpenWeatherClient {
    pub fn new(http: Arc<dyn HttpClientTrait>, endpoints: OpenWeatherEndpoints) -> Self {
        Self { http, endpoints }
    }

    pub async fn current_weather(
        &self,
        api_key: &str,
        query: &WeatherQuery,
    ) -> Result<NormalizedWeather, FetchError> {
        debug!(lat = query.lat(), lon = query.lon(), "Requesting current weather");

        let params = [
            ("lat", query.lat()),
            ("lon", query.lon()),
            ("appid", api_key),
            ("units", "metric"),
            ("lang", self.endpoints.locale.as_str()),
        ];

        let body = self
            .http
            .get_json(&self.endpoints.weather_url, &params)
            .await
            .map_err(|e| e.for_provider(Provider::Weather))?;

        Ok(normalize_weather(body)?)
    }

    pub async fn geocode(
        &self,
        api_key: &str,
        query: &GeolocationQuery,
    ) -> Result<NormalizedGeolocation, FetchError> {
        debug!(address = query.address(), "Requesting geocoding");

        let params = [("q", query.address()), ("limit", "1"), ("appid", api_key)];

        let body = self
            .http
            .get_json(&self.endpoints.geocoding_url, &params)
            .await
            .map_err(|e| e.for_provider(Provider::Geolocation))?;

        Ok(normalize_geolocation(query.address(), body)?)
    }
}
