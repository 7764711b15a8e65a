//! Domain layer - Provider data types, cache abstraction and error taxonomy

pub mod cache;
pub mod error;
pub mod fetch;
pub mod geolocation;
pub mod provider;
pub mod weather;

pub use cache::{
    Cache, CacheExt, CacheKeyGenerator, CacheKeyParams, Clock, DefaultKeyGenerator, ManualClock,
    SystemClock,
};
pub use error::{FetchError, UpstreamError, UpstreamErrorKind};
pub use fetch::{Coordinates, FetchRequest, NormalizedPayload};
pub use geolocation::{GeolocationQuery, NormalizedGeolocation};
pub use provider::{Provider, UnknownProvider};
pub use weather::{icon_glyph, NormalizedWeather, WeatherQuery, DEFAULT_ICON, DEFAULT_LAT, DEFAULT_LON};
