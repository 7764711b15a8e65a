//! Cache trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::FetchError;

/// Key-value cache with per-entry TTL
///
/// This trait uses JSON strings internally to be dyn-compatible.
/// Use the helper methods for typed get/set operations.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a raw JSON value; expired entries are reported as absent
    async fn get_raw(&self, key: &str) -> Result<Option<String>, FetchError>;

    /// Stores a raw JSON value, fully replacing any previous entry for the key
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), FetchError>;

    /// Deletes a value from the cache
    async fn delete(&self, key: &str) -> Result<bool, FetchError>;

    /// Checks if an unexpired entry exists for the key
    async fn exists(&self, key: &str) -> Result<bool, FetchError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    /// Clears all entries from the cache
    async fn clear(&self) -> Result<(), FetchError>;

    /// Returns approximate number of entries in the cache
    async fn size(&self) -> Result<usize, FetchError>;
}

/// Extension trait providing typed get/set operations
pub trait CacheExt: Cache {
    /// Gets a typed value from the cache
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, FetchError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        FetchError::cache(format!("Failed to deserialize cache value: {}", e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Sets a typed value in the cache with a TTL
    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), FetchError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                FetchError::cache(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_raw(key, &data, ttl).await
        }
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}
