//! Cache-aside fetch of upstream provider data

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};

use super::single_flight::SingleFlight;
use crate::domain::cache::{Cache, CacheExt, CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
use crate::domain::{
    FetchError, FetchRequest, GeolocationQuery, NormalizedGeolocation, NormalizedPayload,
    NormalizedWeather, Provider, WeatherQuery,
};
use crate::infrastructure::observability::{record_cache_lookup, record_upstream_request};
use crate::infrastructure::openweather::OpenWeatherClient;

/// Configuration for the fetch layer
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Upstream credential; fetches fail with a configuration error without it
    pub api_key: Option<String>,
    pub weather_ttl: Duration,
    pub geolocation_ttl: Duration,
    /// Collapse concurrent misses for one key into a single upstream call
    pub single_flight: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            weather_ttl: Provider::Weather.default_ttl(),
            geolocation_ttl: Provider::Geolocation.default_ttl(),
            single_flight: true,
        }
    }
}

impl FetcherConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_ttl(mut self, provider: Provider, ttl: Duration) -> Self {
        match provider {
            Provider::Weather => self.weather_ttl = ttl,
            Provider::Geolocation => self.geolocation_ttl = ttl,
        }
        self
    }

    pub fn without_single_flight(mut self) -> Self {
        self.single_flight = false;
        self
    }

    pub fn ttl_for(&self, provider: Provider) -> Duration {
        match provider {
            Provider::Weather => self.weather_ttl,
            Provider::Geolocation => self.geolocation_ttl,
        }
    }
}

/// Resolves fetch requests to normalized provider data.
///
/// Within a TTL window each distinct (provider, parameters) pair costs at
/// most one upstream call. Only successful upstream results are cached and
/// failures are returned as-is, without retries or stale fallbacks.
#[derive(Debug)]
pub struct ExternalDataFetcher {
    cache: Arc<dyn Cache>,
    client: OpenWeatherClient,
    config: FetcherConfig,
    key_generator: DefaultKeyGenerator,
    in_flight: SingleFlight,
}

impl ExternalDataFetcher {
    pub fn new(cache: Arc<dyn Cache>, client: OpenWeatherClient, config: FetcherConfig) -> Self {
        Self {
            cache,
            client,
            config,
            key_generator: DefaultKeyGenerator::new(),
            in_flight: SingleFlight::new(),
        }
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Cache key for a provider and its relevant parameters
    pub fn cache_key(&self, provider: Provider, params: &CacheKeyParams) -> String {
        self.key_generator
            .generate_with_namespace(provider.as_str(), params)
    }

    /// Resolves any provider request
    #[instrument(skip(self, request), fields(provider = %request.provider()))]
    pub async fn fetch(&self, request: &FetchRequest) -> Result<NormalizedPayload, FetchError> {
        match request.provider() {
            Provider::Weather => {
                let query = WeatherQuery::from_parameters(request.parameters())?;
                self.fetch_weather(&query)
                    .await
                    .map(NormalizedPayload::Weather)
            }
            Provider::Geolocation => {
                let query = GeolocationQuery::from_parameters(request.parameters())?;
                self.fetch_geolocation(&query)
                    .await
                    .map(NormalizedPayload::Geolocation)
            }
        }
    }

    pub async fn fetch_weather(&self, query: &WeatherQuery) -> Result<NormalizedWeather, FetchError> {
        let api_key = self.api_key()?;
        let key = self.cache_key(Provider::Weather, &query.cache_params());

        self.cache_aside(Provider::Weather, &key, || {
            self.client.current_weather(api_key, query)
        })
        .await
    }

    pub async fn fetch_geolocation(
        &self,
        query: &GeolocationQuery,
    ) -> Result<NormalizedGeolocation, FetchError> {
        let api_key = self.api_key()?;
        let key = self.cache_key(Provider::Geolocation, &query.cache_params());

        self.cache_aside(Provider::Geolocation, &key, || {
            self.client.geocode(api_key, query)
        })
        .await
    }

    fn api_key(&self) -> Result<&str, FetchError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| FetchError::configuration("OpenWeatherMap API key not configured"))
    }

    async fn cache_aside<V, F, Fut>(
        &self,
        provider: Provider,
        key: &str,
        load: F,
    ) -> Result<V, FetchError>
    where
        V: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, FetchError>>,
    {
        if let Some(hit) = self.lookup(key).await {
            record_cache_lookup(provider, true);
            debug!(key, "Cache hit");
            return Ok(hit);
        }
        record_cache_lookup(provider, false);

        let _permit = if self.config.single_flight {
            let permit = self.in_flight.acquire(key).await;

            // Another caller may have stored the value while we waited
            if let Some(hit) = self.lookup(key).await {
                debug!(key, "Cache filled by concurrent fetch");
                return Ok(hit);
            }

            Some(permit)
        } else {
            None
        };

        debug!(key, "Cache miss, calling upstream");

        let started = Instant::now();
        let result = load().await;
        record_upstream_request(provider, result.is_ok(), started.elapsed());

        let value = result.inspect_err(|e| warn!(key, error = %e, "Upstream fetch failed"))?;

        if let Err(e) = self.cache.set(key, &value, self.config.ttl_for(provider)).await {
            warn!(key, error = %e, "Failed to store value in cache");
        }

        Ok(value)
    }

    async fn lookup<V>(&self, key: &str) -> Option<V>
    where
        V: DeserializeOwned + Send,
    {
        let result: Result<Option<V>, FetchError> = self.cache.get(key).await;

        result.unwrap_or_else(|e| {
            warn!(key, error = %e, "Cache read failed, treating as miss");
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{ManualClock, MockCache};
    use crate::domain::{Coordinates, UpstreamErrorKind};
    use crate::infrastructure::cache::{InMemoryCache, InMemoryCacheConfig};
    use crate::infrastructure::openweather::http_client::mock::MockHttpClient;
    use crate::infrastructure::openweather::weather::fixtures;
    use crate::infrastructure::openweather::{
        HttpClient, OpenWeatherEndpoints, DEFAULT_GEOCODING_URL, DEFAULT_WEATHER_URL,
    };
    use wiremock::matchers::{any, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WEATHER_PATH: &str = "/data/2.5/weather";
    const GEOCODING_PATH: &str = "/geo/1.0/direct";

    struct Harness {
        fetcher: ExternalDataFetcher,
        cache: Arc<InMemoryCache>,
        clock: Arc<ManualClock>,
    }

    fn harness(server: &MockServer, config: FetcherConfig) -> Harness {
        let clock = Arc::new(ManualClock::new(0));
        let cache = Arc::new(InMemoryCache::with_clock(
            InMemoryCacheConfig::default(),
            clock.clone(),
        ));
        let client = OpenWeatherClient::new(
            Arc::new(HttpClient::new().unwrap()),
            OpenWeatherEndpoints::with_base_url(&server.uri()),
        );

        Harness {
            fetcher: ExternalDataFetcher::new(cache.clone(), client, config),
            cache,
            clock,
        }
    }

    fn configured() -> FetcherConfig {
        FetcherConfig::default().with_api_key("test-key")
    }

    fn berlin_geocoding() -> serde_json::Value {
        serde_json::json!([{"name": "Berlin", "lat": 52.52, "lon": 13.405, "country": "DE"}])
    }

    async fn mount_weather(server: &MockServer, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .and(query_param("appid", "test-key"))
            .and(query_param("units", "metric"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(fixtures::berlin(21.4, "01d", "klar")),
            )
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_same_coordinates_within_ttl_hit_upstream_once() {
        let server = MockServer::start().await;
        mount_weather(&server, 1).await;
        let h = harness(&server, configured());

        let request = FetchRequest::weather_at("52.5200", "13.4050");
        let first = h.fetcher.fetch(&request).await.unwrap();
        h.clock.advance(Duration::from_secs(300));
        let second = h.fetcher.fetch(&request).await.unwrap();

        assert_eq!(first, second);
        match first {
            NormalizedPayload::Weather(weather) => {
                assert_eq!(weather.temperature_celsius, 21);
                assert_eq!(weather.icon_glyph, "☀️");
                assert_eq!(weather.condition_description, "klar");
            }
            other => panic!("unexpected payload: {other:?}"),
        }

        server.verify().await;
    }

    #[tokio::test]
    async fn test_default_coordinates_share_cache_with_explicit_defaults() {
        let server = MockServer::start().await;
        mount_weather(&server, 1).await;
        let h = harness(&server, configured());

        h.fetcher.fetch(&FetchRequest::weather()).await.unwrap();
        h.fetcher
            .fetch(&FetchRequest::weather_at("52.5200", "13.4050").with_param("unused", "x"))
            .await
            .unwrap();

        server.verify().await;
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let server = MockServer::start().await;
        mount_weather(&server, 2).await;
        let h = harness(&server, configured());

        let request = FetchRequest::weather();
        h.fetcher.fetch(&request).await.unwrap();

        h.clock.set(600_000);
        h.fetcher.fetch(&request).await.unwrap();

        h.clock.set(601_000);
        h.fetcher.fetch(&request).await.unwrap();

        server.verify().await;
    }

    #[tokio::test]
    async fn test_geolocation_berlin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GEOCODING_PATH))
            .and(query_param("q", "Berlin"))
            .and(query_param("limit", "1"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(berlin_geocoding()))
            .expect(1)
            .mount(&server)
            .await;
        let h = harness(&server, configured());

        let payload = h
            .fetcher
            .fetch(&FetchRequest::geolocation("Berlin"))
            .await
            .unwrap();

        assert_eq!(
            payload,
            NormalizedPayload::Geolocation(NormalizedGeolocation {
                address: "Berlin".to_string(),
                coordinates: Coordinates::new(52.52, 13.405),
                name: "Berlin".to_string(),
                country: "DE".to_string(),
            })
        );

        server.verify().await;
    }

    #[tokio::test]
    async fn test_address_variants_are_separate_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GEOCODING_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(berlin_geocoding()))
            .expect(2)
            .mount(&server)
            .await;
        let h = harness(&server, configured());

        h.fetcher.fetch(&FetchRequest::geolocation("Berlin")).await.unwrap();
        let lower = h
            .fetcher
            .fetch(&FetchRequest::geolocation("berlin "))
            .await
            .unwrap();

        match lower {
            NormalizedPayload::Geolocation(location) => assert_eq!(location.address, "berlin "),
            other => panic!("unexpected payload: {other:?}"),
        }
        assert_eq!(h.cache.size().await.unwrap(), 2);

        server.verify().await;
    }

    #[tokio::test]
    async fn test_missing_or_empty_address_never_calls_upstream() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let h = harness(&server, configured());

        let empty = h.fetcher.fetch(&FetchRequest::geolocation("")).await;
        let absent = h
            .fetcher
            .fetch(&FetchRequest::new(Provider::Geolocation))
            .await;

        assert!(matches!(empty, Err(FetchError::InvalidRequest { .. })));
        assert!(matches!(absent, Err(FetchError::InvalidRequest { .. })));

        server.verify().await;
    }

    #[tokio::test]
    async fn test_invalid_coordinates_never_call_upstream() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let h = harness(&server, configured());

        let result = h
            .fetcher
            .fetch(&FetchRequest::weather_at("somewhere", "13.4"))
            .await;

        assert!(matches!(result, Err(FetchError::InvalidRequest { .. })));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let h = harness(&server, FetcherConfig::default());

        let weather = h.fetcher.fetch(&FetchRequest::weather()).await;
        let geo = h.fetcher.fetch(&FetchRequest::geolocation("Berlin")).await;

        assert!(matches!(weather, Err(FetchError::Configuration { .. })));
        assert!(matches!(geo, Err(FetchError::Configuration { .. })));
        assert_eq!(h.cache.size().await.unwrap(), 0);

        server.verify().await;
    }

    #[tokio::test]
    async fn test_invalid_request_reported_before_missing_key() {
        let server = MockServer::start().await;
        let h = harness(&server, FetcherConfig::default());

        let result = h.fetcher.fetch(&FetchRequest::geolocation("")).await;

        assert!(matches!(result, Err(FetchError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(2)
            .mount(&server)
            .await;
        let h = harness(&server, configured());

        for _ in 0..2 {
            let err = h.fetcher.fetch(&FetchRequest::weather()).await.unwrap_err();

            match err {
                FetchError::Upstream(upstream) => {
                    assert_eq!(upstream.provider, Provider::Weather);
                    assert_eq!(upstream.kind, UpstreamErrorKind::Status(500));
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(h.cache.size().await.unwrap(), 0);
        }

        server.verify().await;
    }

    #[tokio::test]
    async fn test_empty_geocoding_result_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GEOCODING_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;
        let h = harness(&server, configured());

        let err = h
            .fetcher
            .fetch(&FetchRequest::geolocation("Atlantis"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FetchError::Upstream(ref upstream) if upstream.kind == UpstreamErrorKind::EmptyResult
        ));
        assert_eq!(h.cache.size().await.unwrap(), 0);

        server.verify().await;
    }

    #[tokio::test]
    async fn test_concurrent_misses_collapse_into_one_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(fixtures::berlin(21.4, "01d", "klar"))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;
        let h = harness(&server, configured());

        let request = FetchRequest::weather();
        let results =
            futures::future::join_all((0..5).map(|_| h.fetcher.fetch(&request))).await;

        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert_eq!(result.as_ref().unwrap(), first);
        }

        server.verify().await;
    }

    #[tokio::test]
    async fn test_without_single_flight_each_miss_calls_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(fixtures::berlin(21.4, "01d", "klar"))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(3)
            .mount(&server)
            .await;
        let h = harness(&server, configured().without_single_flight());

        let request = FetchRequest::weather();
        let results =
            futures::future::join_all((0..3).map(|_| h.fetcher.fetch(&request))).await;

        assert!(results.iter().all(Result::is_ok));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_provider_ttls_are_applied() {
        let cache = Arc::new(MockCache::new());
        let http = Arc::new(
            MockHttpClient::new()
                .with_response(DEFAULT_WEATHER_URL, fixtures::berlin(21.4, "01d", "klar"))
                .with_response(DEFAULT_GEOCODING_URL, berlin_geocoding()),
        );
        let client = OpenWeatherClient::new(http, OpenWeatherEndpoints::default());
        let fetcher = ExternalDataFetcher::new(cache.clone(), client, configured());

        fetcher.fetch(&FetchRequest::weather()).await.unwrap();
        fetcher.fetch(&FetchRequest::geolocation("Berlin")).await.unwrap();

        let weather_key = fetcher.cache_key(Provider::Weather, &WeatherQuery::default().cache_params());
        let geo_key = fetcher.cache_key(
            Provider::Geolocation,
            &GeolocationQuery::new("Berlin").unwrap().cache_params(),
        );

        assert!(weather_key.starts_with("weather:"));
        assert!(geo_key.starts_with("geolocation:"));
        assert_eq!(cache.ttl_of(&weather_key), Some(Duration::from_secs(600)));
        assert_eq!(cache.ttl_of(&geo_key), Some(Duration::from_secs(3600)));
        assert_eq!(cache.writes(), 2);
    }

    #[tokio::test]
    async fn test_cached_value_is_already_rounded() {
        let cache = Arc::new(MockCache::new());
        let http = Arc::new(
            MockHttpClient::new()
                .with_response(DEFAULT_WEATHER_URL, fixtures::berlin(21.6, "10d", "leichter Regen")),
        );
        let client = OpenWeatherClient::new(http, OpenWeatherEndpoints::default());
        let fetcher = ExternalDataFetcher::new(cache.clone(), client, configured());

        fetcher.fetch(&FetchRequest::weather()).await.unwrap();

        let key = fetcher.cache_key(Provider::Weather, &WeatherQuery::default().cache_params());
        let stored: NormalizedWeather = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(stored.temperature_celsius, 22);
        assert_eq!(stored.icon_glyph, "🌦️");
    }

    #[tokio::test]
    async fn test_cache_errors_degrade_to_upstream() {
        let cache = Arc::new(MockCache::new().with_error("backend down"));
        let http = Arc::new(
            MockHttpClient::new()
                .with_response(DEFAULT_WEATHER_URL, fixtures::berlin(21.4, "01d", "klar")),
        );
        let client = OpenWeatherClient::new(http.clone(), OpenWeatherEndpoints::default());
        let fetcher = ExternalDataFetcher::new(cache, client, configured());

        let payload = fetcher.fetch(&FetchRequest::weather()).await.unwrap();

        assert_eq!(payload.provider(), Provider::Weather);
        assert_eq!(http.request_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_upstream() {
        let http = Arc::new(MockHttpClient::new());
        let client = OpenWeatherClient::new(http.clone(), OpenWeatherEndpoints::default());
        let probe = ExternalDataFetcher::new(Arc::new(MockCache::new()), client.clone(), configured());
        let key = probe.cache_key(
            Provider::Geolocation,
            &GeolocationQuery::new("Berlin").unwrap().cache_params(),
        );

        let cached = NormalizedGeolocation {
            address: "Berlin".to_string(),
            coordinates: Coordinates::new(52.52, 13.405),
            name: "Berlin".to_string(),
            country: "DE".to_string(),
        };
        let cache = Arc::new(MockCache::new().with_entry(&key, &cached, Duration::from_secs(3600)));
        let fetcher = ExternalDataFetcher::new(cache.clone(), client, configured());

        let payload = fetcher.fetch(&FetchRequest::geolocation("Berlin")).await.unwrap();

        assert_eq!(payload, NormalizedPayload::Geolocation(cached));
        assert_eq!(http.request_count(), 0);
        assert_eq!(cache.writes(), 0);
    }

    #[test]
    fn test_fetcher_config_builders() {
        let config = FetcherConfig::default()
            .with_api_key("k")
            .with_ttl(Provider::Weather, Duration::from_secs(30))
            .without_single_flight();

        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.ttl_for(Provider::Weather), Duration::from_secs(30));
        assert_eq!(config.ttl_for(Provider::Geolocation), Duration::from_secs(3600));
        assert!(!config.single_flight);
    }
}
