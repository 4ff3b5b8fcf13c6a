//! Per-key async mutual exclusion
//!
//! Callers working on the same key (a post URL) run one at a time; different
//! keys never wait on each other. An entry lives in the map only while some
//! caller holds or awaits its lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct KeyedLock {
    in_flight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Holds the lock for one key until dropped.
pub struct KeyedGuard<'a> {
    owner: &'a KeyedLock,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other caller holds `key`, then hold it.
    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let slot = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(in_flight.entry(key.to_string()).or_default())
        };

        KeyedGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(slot.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();

        let mut in_flight = self
            .owner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Waiters clone the slot under this map lock, so a count of one
        // means nobody else is queued on it.
        if in_flight
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            in_flight.remove(&self.key);
        }
    }
}
