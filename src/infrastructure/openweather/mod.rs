//! OpenWeather upstream - HTTP client, request building and response normalization

mod client;
mod geocoding;
pub mod http_client;
pub(crate) mod weather;

pub use client::{
    OpenWeatherClient, OpenWeatherEndpoints, DEFAULT_GEOCODING_URL, DEFAULT_LOCALE,
    DEFAULT_WEATHER_URL,
};
pub use geocoding::normalize_geolocation;
pub use http_client::{HttpClient, HttpClientTrait, HttpError, DEFAULT_TIMEOUT};
pub use weather::normalize_weather;
