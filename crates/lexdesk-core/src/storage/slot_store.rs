//! Slot store trait.
//!
//! A slot is a namespaced key holding one JSON document, the same shape as a
//! browser local-storage entry. Each store owns its slots exclusively.

use lexdesk_types::error::StorageError;
use lexdesk_types::storage::SlotDocument;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Trait for persisted key/value slot storage.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// The SQLite implementation lives in lexdesk-infra.
pub trait SlotStore: Send + Sync {
    /// Read a slot. Returns None if the key has never been written.
    fn load(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<serde_json::Value>, StorageError>> + Send;

    /// Write a slot (upsert).
    fn save(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Remove a slot. No-op if the key does not exist.
    fn remove(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// List keys starting with `prefix`, sorted.
    fn list_keys(
        &self,
        prefix: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StorageError>> + Send;
}

/// Load a collection slot, treating a missing slot as empty.
pub async fn load_collection<S, T>(slots: &S, key: &str) -> Result<Vec<T>, StorageError>
where
    S: SlotStore,
    T: Serialize + DeserializeOwned,
{
    match slots.load(key).await? {
        Some(value) => SlotDocument::decode(key, value),
        None => Ok(Vec::new()),
    }
}

/// Write a whole collection back to its slot as a versioned document.
pub async fn save_collection<S, T>(slots: &S, key: &str, items: &[T]) -> Result<(), StorageError>
where
    S: SlotStore,
    T: Serialize + DeserializeOwned + Clone,
{
    let value = SlotDocument::encode(items)?;
    slots.save(key, &value).await
}
