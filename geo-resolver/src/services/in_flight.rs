//! In-process coalescing of concurrent resolutions
//!
//! While a resolution for a cache key is running, later callers for the same
//! key wait on it instead of starting their own provider call. The slot is
//! dropped once the leading call finishes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

type Slot<T> = Arc<OnceCell<T>>;

/// Map from cache key to the single pending resolution for that key
#[derive(Debug)]
pub struct InFlightResolutions<T> {
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T> Default for InFlightResolutions<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> InFlightResolutions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `resolve` for `key` unless a run is already pending, then share its output
    ///
    /// If the leading caller is cancelled, the next waiter takes over.
    pub async fn resolve<F, Fut>(&self, key: &str, resolve: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let outcome = slot.get_or_init(resolve).await.clone();

        let mut slots = self.slots.lock().await;
        if slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, &slot))
        {
            slots.remove(key);
        }

        outcome
    }

    /// Number of keys with a resolution currently pending
    pub async fn pending(&self) -> usize {
        self.slots.lock().await.len()
    }
}
