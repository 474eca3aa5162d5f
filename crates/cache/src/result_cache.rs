//! Memoizing result cache with durable, best-effort persistence.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tracing::{debug, info, warn};

use zins_core::calc::{CalcInput, CalcResult};
use zins_store::DurableStore;

use crate::key::cache_key;

/// Durable key for a cache record.
fn durable_key(key: &str) -> String {
    format!("cache/{key}")
}

/// Memoizes engine outputs by canonical `(type, input)` key.
///
/// Entries are written once and never mutated; the map is capped at
/// `max_entries` with least-recently-used eviction. Persistence is
/// best-effort: a storage failure never fails the compute call.
pub struct ResultCache {
    entries: Mutex<LruCache<String, CalcResult>>,
    /// Per-key computation locks, so two tasks with the same input never
    /// run the engine concurrently for one key. The map itself is only
    /// ever locked for quick lookups, never across an await.
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    store: Arc<dyn DurableStore>,
}

/// Clears a key's in-flight slot when its computation ends, including
/// when the owning future is dropped mid-await (timeout, task abort).
struct InFlightSlot<'a> {
    cache: &'a ResultCache,
    key: &'a str,
    lock: &'a Arc<tokio::sync::Mutex<()>>,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.cache.in_flight.lock().unwrap();
        // A later caller may already have installed a fresh lock for the
        // same key; only remove the slot this computation owned.
        if in_flight
            .get(self.key)
            .is_some_and(|l| Arc::ptr_eq(l, self.lock))
        {
            in_flight.remove(self.key);
        }
    }
}

impl ResultCache {
    pub fn new(store: Arc<dyn DurableStore>, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(max_entries.max(1)).unwrap(),
            )),
            in_flight: Mutex::new(HashMap::new()),
            store,
        }
    }

    /// Rehydrate persisted entries. Corrupt or unreadable records are
    /// dropped with a warning. Returns the number of entries restored.
    pub async fn load(&self) -> usize {
        let keys = match self.store.list_keys("cache/").await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Result cache reload skipped");
                return 0;
            }
        };

        let mut restored = 0;
        for durable in keys {
            let bytes = match self.store.get(&durable).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(e) => {
                    warn!(key = %durable, error = %e, "Skipping unreadable cache record");
                    continue;
                }
            };
            let result: CalcResult = match serde_json::from_slice(&bytes) {
                Ok(result) => result,
                Err(e) => {
                    warn!(key = %durable, error = %e, "Dropping corrupt cache record");
                    continue;
                }
            };
            let key = durable.trim_start_matches("cache/").to_string();
            self.entries.lock().unwrap().put(key, result);
            restored += 1;
        }

        if restored > 0 {
            info!(entries = restored, "Result cache loaded");
        }
        restored
    }

    /// Number of in-memory entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the memoized result for `input`, computing it via `compute`
    /// on a miss. Errors from `compute` are propagated and never cached.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        input: &CalcInput,
        compute: F,
    ) -> Result<CalcResult, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CalcResult, E>>,
    {
        let key = cache_key(input);

        // The lookup is bound to a local so the map guard is released
        // before any await point; the returned future stays Send.
        let cached = self.entries.lock().unwrap().get(&key).cloned();
        if let Some(result) = cached {
            debug!(key = %key, "Cache hit");
            return Ok(result);
        }

        // Serialize computations per key: a second caller for the same
        // input waits here and then finds the first caller's result.
        let key_lock = {
            let mut in_flight = self.in_flight.lock().unwrap();
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };
        let _slot = InFlightSlot {
            cache: self,
            key: &key,
            lock: &key_lock,
        };
        let _guard = key_lock.lock().await;

        let cached = self.entries.lock().unwrap().get(&key).cloned();
        if let Some(result) = cached {
            debug!(key = %key, "Cache hit after wait");
            return Ok(result);
        }

        debug!(key = %key, "Cache miss");
        let result = compute().await?;

        self.entries.lock().unwrap().put(key.clone(), result.clone());

        // Best-effort persistence; in-memory processing continues either way.
        match serde_json::to_vec(&result) {
            Ok(bytes) => {
                if let Err(e) = self.store.put(&durable_key(&key), &bytes).await {
                    warn!(key = %key, error = %e, "Failed to persist cache entry");
                }
            }
            Err(e) => warn!(key = %key, error = %e, "Failed to encode cache entry"),
        }

        Ok(result)
    }
}
