//! In-memory slot store.
//!
//! Backs ephemeral runs and tests. Writes can be made to fail on demand so
//! callers can observe memory-only mutations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use lexdesk_types::error::StorageError;

use super::slot_store::SlotStore;

/// `DashMap`-backed implementation of `SlotStore`.
///
/// Cloning shares the underlying map, so a clone handed to a second store
/// instance sees the same slots (the "page reload" case in tests).
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStore {
    slots: Arc<DashMap<String, serde_json::Value>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save`/`remove` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of slots currently held.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::Backend("memory slot store is read-only".to_string()))
        } else {
            Ok(())
        }
    }
}

impl SlotStore for MemorySlotStore {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        Ok(self.slots.get(key).map(|v| v.value().clone()))
    }

    async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        self.check_writable()?;
        self.slots.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.slots.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self
            .slots
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let store = MemorySlotStore::new();
        store.save("a.settings", &json!({"theme": "dark"})).await.unwrap();
        assert_eq!(
            store.load("a.settings").await.unwrap(),
            Some(json!({"theme": "dark"}))
        );
        assert!(store.load("a.missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clone_shares_slots() {
        let store = MemorySlotStore::new();
        let reopened = store.clone();
        store.save("k", &json!(1)).await.unwrap();
        assert_eq!(reopened.load("k").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_fail_writes() {
        let store = MemorySlotStore::new();
        store.save("k", &json!(1)).await.unwrap();
        store.set_fail_writes(true);

        assert!(matches!(
            store.save("k", &json!(2)).await,
            Err(StorageError::Backend(_))
        ));
        assert!(store.remove("k").await.is_err());
        // Reads still work and see the last good value.
        assert_eq!(store.load("k").await.unwrap(), Some(json!(1)));

        store.set_fail_writes(false);
        store.remove("k").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_list_keys_filters_and_sorts() {
        let store = MemorySlotStore::new();
        for key in ["b.two", "a.zeta", "a.alpha", "ab.other"] {
            store.save(key, &json!(null)).await.unwrap();
        }
        assert_eq!(store.list_keys("a.").await.unwrap(), vec!["a.alpha", "a.zeta"]);
        assert_eq!(store.len(), 4);
    }
}
