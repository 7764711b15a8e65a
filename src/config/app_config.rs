use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::openweather::{
    DEFAULT_GEOCODING_URL, DEFAULT_LOCALE, DEFAULT_TIMEOUT, DEFAULT_WEATHER_URL,
};

/// Environment variable consulted when no key is set in the config sources
pub const API_KEY_ENV_FALLBACK: &str = "OPENWEATHERMAP_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub openweather: OpenWeatherConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Upstream credential and endpoints
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct OpenWeatherConfig {
    pub api_key: Option<String>,
    pub weather_url: String,
    pub geocoding_url: String,
    pub locale: String,
    pub timeout_secs: u64,
}

/// Cache sizing and per-provider freshness
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_capacity: u64,
    pub weather_ttl_secs: u64,
    pub geolocation_ttl_secs: u64,
    /// Collapse concurrent misses for the same key into one upstream call
    pub single_flight: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            weather_ttl_secs: 600,
            geolocation_ttl_secs: 3600,
            single_flight: true,
        }
    }
}

// Keeps the key out of logs when the config is printed with {:?}
impl std::fmt::Debug for OpenWeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("weather_url", &self.weather_url)
            .field("geocoding_url", &self.geocoding_url)
            .field("locale", &self.locale)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl OpenWeatherConfig {
    /// Configured key, or the fallback environment variable. Blank values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| lookup(API_KEY_ENV_FALLBACK))
            .filter(|key| !key.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CacheSettings {
    pub fn weather_ttl(&self) -> Duration {
        Duration::from_secs(self.weather_ttl_secs)
    }

    pub fn geolocation_ttl(&self) -> Duration {
        Duration::from_secs(self.geolocation_ttl_secs)
    }

    /// Longest TTL any entry can be written with
    pub fn max_ttl(&self) -> Duration {
        self.weather_ttl().max(self.geolocation_ttl())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
