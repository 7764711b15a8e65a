//! Per-key async locks for collapsing concurrent cache misses

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type KeyLock = Arc<AsyncMutex<()>>;

/// Registry of in-flight keys. Only callers for the same key wait on each other.
#[derive(Debug, Default)]
pub struct SingleFlight {
    locks: Mutex<HashMap<String, KeyLock>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds `key`, then holds it until the
    /// returned permit is dropped.
    pub async fn acquire(&self, key: &str) -> SingleFlightPermit<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(key.to_string()).or_default().clone()
        };

        let guard = lock.clone().lock_owned().await;

        SingleFlightPermit {
            registry: self,
            key: key.to_string(),
            lock,
            guard: Some(guard),
        }
    }

    /// Number of keys currently tracked
    pub fn in_flight(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, key: &str, lock: &KeyLock) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        // Registry + this permit; anything above means a waiter still needs the entry
        if Arc::strong_count(lock) == 2 {
            locks.remove(key);
        }
    }
}

/// Exclusive hold on one key
#[derive(Debug)]
pub struct SingleFlightPermit<'a> {
    registry: &'a SingleFlight,
    key: String,
    lock: KeyLock,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SingleFlightPermit<'_> {
    fn drop(&mut self) {
        // The guard owns a clone of the lock; let it go before counting
        self.guard.take();
        self.registry.release(&self.key, &self.lock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let flight = SingleFlight::new();

        {
            let _permit = flight.acquire("weather:a").await;
            assert_eq!(flight.in_flight(), 1);
        }

        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_same_key_waits() {
        let flight = Arc::new(SingleFlight::new());
        let permit = flight.acquire("k").await;

        let waiter = {
            let flight = flight.clone();
            tokio::spawn(async move {
                let _permit = flight.acquire("k").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(permit);
        waiter.await.unwrap();
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_wait() {
        let flight = SingleFlight::new();

        let _a = flight.acquire("a").await;
        let acquired = tokio::time::timeout(Duration::from_millis(100), flight.acquire("b")).await;

        assert!(acquired.is_ok());
    }
}
