//! Last-known scan results.
//!
//! The store only ever sees opaque byte blobs; [`ResultCache`] owns the
//! key scheme and the JSON encoding.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::types::scan::ScanResult;

/// Prefix of every cached scan result key.
pub const RESULT_KEY_PREFIX: &str = "scan_result_";

/// A client-local key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Returns the blob stored under `key`.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores `value` under `key`, replacing any previous blob.
    fn set(&self, key: &str, value: Vec<u8>);

    /// Removes the blob stored under `key`.
    fn remove(&self, key: &str);
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Vec<u8>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}

/// Scan results keyed by file id.
pub struct ResultCache {
    store: Arc<dyn KeyValueStore>,
}

impl ResultCache {
    /// Creates a cache over `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(file_id: &str) -> String {
        format!("{}{}", RESULT_KEY_PREFIX, file_id)
    }

    /// Stores `result` under its file id.
    pub fn put(&self, result: &ScanResult) {
        match serde_json::to_vec(result) {
            Ok(blob) => self.store.set(&Self::key(&result.file_id), blob),
            Err(e) => tracing::warn!(file_id = %result.file_id, error = %e, "Could not encode scan result"),
        }
    }

    /// Returns the last known result for `file_id`.
    ///
    /// A blob that no longer decodes is dropped and reported as absent.
    pub fn get(&self, file_id: &str) -> Option<ScanResult> {
        let key = Self::key(file_id);
        let blob = self.store.get(&key)?;
        match serde_json::from_slice(&blob) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(file_id, error = %e, "Discarding corrupt cached scan result");
                self.store.remove(&key);
                None
            }
        }
    }

    /// Forgets the result for `file_id`.
    pub fn evict(&self, file_id: &str) {
        self.store.remove(&Self::key(file_id));
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::fixtures;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_put_then_get() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResultCache::new(store.clone());
        let result = fixtures::scan_result("doc-1");

        cache.put(&result);

        assert_eq!(cache.get("doc-1"), Some(result));
        assert!(store.get("scan_result_doc-1").is_some());
        assert_eq!(cache.get("doc-2"), None);
    }

    #[test]
    fn test_corrupt_blob_is_absent_and_dropped() {
        let store = Arc::new(MemoryStore::new());
        store.set("scan_result_doc-1", b"{not json".to_vec());
        let cache = ResultCache::new(store.clone());

        assert_eq!(cache.get("doc-1"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_evict() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResultCache::new(store.clone());
        cache.put(&fixtures::scan_result("doc-1"));

        cache.evict("doc-1");

        assert_eq!(cache.get("doc-1"), None);
        assert_eq!(store.len(), 0);
    }
}
