//! The durable key-value capability the queue persists through.
//!
//! Records cross this boundary as raw bytes; typed encode/decode happens
//! in the callers ([`crate::task_store`], the result cache), keeping the
//! underlying engine swappable.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreError;

/// Key-value persistence that survives process restarts.
///
/// Implementations handle the specifics of a particular storage engine
/// (filesystem, embedded KV store, browser object store behind FFI).
/// All operations may fail with a [`StoreError`]; callers treat failures
/// as non-fatal where the contract allows it.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Write a record, replacing any previous value, as one unit.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Read a record. `Ok(None)` means the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Remove a record. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List all keys starting with `prefix`.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// In-memory store, the default for tests and short-lived sessions.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.records
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.records.read().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.records.write().unwrap().remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self
            .records
            .read()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
