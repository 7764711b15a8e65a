//! Cache key generation strategies

use std::collections::BTreeMap;
use std::fmt::Debug;

use sha2::{Digest, Sha256};

/// Trait for generating cache keys from input data
pub trait CacheKeyGenerator: Send + Sync + Debug {
    /// Generates a cache key from the given components
    fn generate(&self, params: &CacheKeyParams) -> String;

    /// Generates a key with a namespace prefix
    fn generate_with_namespace(&self, namespace: &str, params: &CacheKeyParams) -> String {
        format!("{}:{}", namespace, self.generate(params))
    }
}

/// Parameters for cache key generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheKeyParams {
    /// Key components (sorted for consistency)
    pub components: BTreeMap<String, String>,
}

impl CacheKeyParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component to the key parameters
    pub fn with_component(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.components.insert(key.into(), value.into());
        self
    }

    /// Unambiguous textual form of the components.
    ///
    /// Values are embedded as JSON strings so separators inside a value can
    /// never make two different component sets serialize identically.
    pub fn canonical(&self) -> String {
        serde_json::to_string(&self.components).unwrap_or_default()
    }
}

/// Content-hash key generator (SHA-256 over the canonical components)
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyGenerator;

impl DefaultKeyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl CacheKeyGenerator for DefaultKeyGenerator {
    fn generate(&self, params: &CacheKeyParams) -> String {
        let mut hasher = Sha256::new();
        hasher.update(params.canonical().as_bytes());
        hex::encode(hasher.finalize())
    }
}
