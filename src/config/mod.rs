mod app_config;

pub use app_config::{
    AppConfig, CacheSettings, LogFormat, LoggingConfig, OpenWeatherConfig, ServerConfig,
    API_KEY_ENV_FALLBACK,
};
