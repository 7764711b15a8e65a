//! Cache domain - key-value store abstraction injected into the fetch layer

mod clock;
mod key;
mod repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use key::{CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::MockCache;
