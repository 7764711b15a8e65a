//! API Dashboard backend
//!
//! Serves weather and geolocation data to the dashboard widgets. Upstream
//! OpenWeather responses are normalized and cached per provider TTL, so
//! repeated widget refreshes stay within the upstream rate limits.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::{info, warn};

use api::state::AppState;
use domain::cache::Cache;
use infrastructure::{
    cache::{InMemoryCache, InMemoryCacheConfig},
    openweather::{HttpClient, OpenWeatherClient, OpenWeatherEndpoints},
    services::{ExternalDataFetcher, FetcherConfig},
};

/// Wires the fetcher from configuration with a fresh in-memory cache
pub fn create_fetcher(config: &AppConfig) -> anyhow::Result<ExternalDataFetcher> {
    let cache_config = InMemoryCacheConfig::default()
        .with_max_capacity(config.cache.max_capacity)
        .with_max_ttl(config.cache.max_ttl());
    let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::with_config(cache_config));

    create_fetcher_with_cache(config, cache)
}

/// Wires the fetcher around an existing cache
pub fn create_fetcher_with_cache(
    config: &AppConfig,
    cache: Arc<dyn Cache>,
) -> anyhow::Result<ExternalDataFetcher> {
    let ow = &config.openweather;

    let http = HttpClient::with_timeout(ow.timeout())?;
    let endpoints = OpenWeatherEndpoints {
        weather_url: ow.weather_url.clone(),
        geocoding_url: ow.geocoding_url.clone(),
        locale: ow.locale.clone(),
    };
    let client = OpenWeatherClient::new(Arc::new(http), endpoints);

    let api_key = ow.resolve_api_key();
    if api_key.is_none() {
        warn!("No OpenWeatherMap API key configured; provider requests will fail");
    }

    let fetcher_config = FetcherConfig {
        api_key,
        weather_ttl: config.cache.weather_ttl(),
        geolocation_ttl: config.cache.geolocation_ttl(),
        single_flight: config.cache.single_flight,
    };

    info!(
        weather_ttl_secs = fetcher_config.weather_ttl.as_secs(),
        geolocation_ttl_secs = fetcher_config.geolocation_ttl.as_secs(),
        single_flight = fetcher_config.single_flight,
        "External data fetcher configured"
    );

    Ok(ExternalDataFetcher::new(cache, client, fetcher_config))
}

/// Create application state for the HTTP server
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let fetcher = create_fetcher(config)?;

    Ok(AppState::new(Arc::new(fetcher)))
}
