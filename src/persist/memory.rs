//! In-process store.

use super::{ArtifactHandle, PersistenceCodec};
use crate::core::filter::FilterState;
use crate::error::{BloomSyncError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Keeps artifacts in a map guarded by a reader-writer lock.
///
/// Useful in tests and for embedding filters in a process that snapshots them
/// elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    artifacts: RwLock<HashMap<String, FilterState>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.read().len()
    }

    /// `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.read().is_empty()
    }

    /// Stored ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.artifacts.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drop the artifact for `id`, returning it if present.
    pub fn remove(&self, id: &str) -> Option<FilterState> {
        self.artifacts.write().remove(id)
    }
}

impl PersistenceCodec for MemoryStore {
    fn store(&self, state: &FilterState) -> Result<ArtifactHandle> {
        let id = state.params().id().to_string();
        self.artifacts.write().insert(id.clone(), state.clone());
        tracing::debug!(id = %id, "filter stored in memory");
        Ok(ArtifactHandle::new(id))
    }

    fn load(&self, id: &str) -> Result<FilterState> {
        self.artifacts
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| BloomSyncError::artifact_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::{FilterParams, Seeds};
    use std::sync::Arc;
    use std::thread;

    fn state(id: &str, word: u64) -> FilterState {
        let params = FilterParams::new(id, 64, 2, Seeds::DEFAULT).unwrap();
        FilterState::new(params, vec![word]).unwrap()
    }

    #[test]
    fn test_store_load_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        let handle = store.store(&state("a", 5)).unwrap();
        assert_eq!(handle.id(), "a");
        assert!(handle.path().is_none());
        assert_eq!(store.load("a").unwrap(), state("a", 5));

        store.store(&state("a", 6)).unwrap();
        assert_eq!(store.load("a").unwrap().words(), &[6]);
        assert_eq!(store.len(), 1);

        assert!(store.remove("a").is_some());
        assert!(store.load("a").unwrap_err().is_not_found());
    }

    #[test]
    fn test_ids_sorted() {
        let store = MemoryStore::new();
        for id in ["c", "a", "b"] {
            store.store(&state(id, 0)).unwrap();
        }
        assert_eq!(store.ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_concurrent_stores() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store.store(&state(&format!("f{}", i), i)).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 8);
        assert_eq!(store.load("f3").unwrap().words(), &[3]);
    }
}
