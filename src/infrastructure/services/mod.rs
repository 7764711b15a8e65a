//! Application services

mod fetcher;
mod single_flight;

pub use fetcher::{ExternalDataFetcher, FetcherConfig};
pub use single_flight::{SingleFlight, SingleFlightPermit};
