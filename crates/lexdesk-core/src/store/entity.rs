//! Generic create/read/update/delete store over one entity collection.
//!
//! The collection lives in memory and is mirrored to a single slot after
//! every mutation. A failed write-back never rolls back the in-memory change;
//! it is reported through the returned `Write`'s durability instead.

use std::fmt;

use chrono::{DateTime, Utc};
use lexdesk_types::error::{StorageError, StoreError, ValidationError};
use lexdesk_types::storage::{Durability, Write};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::latency::Latency;
use crate::storage::slot_store::{SlotStore, load_collection, save_collection};

/// A record type an `EntityStore` can manage.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: Copy + Eq + fmt::Display + Send + Sync;
    /// Data supplied on create.
    type Draft: Send;
    /// Partial update; unset fields are left alone.
    type Patch: Send;

    /// Human-readable entity kind for log lines (e.g. "client").
    const KIND: &'static str;

    fn new_id() -> Self::Id;
    fn id(&self) -> Self::Id;

    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError>;
    fn validate_patch(patch: &Self::Patch) -> Result<(), ValidationError>;

    /// Build the entity with `created_at == updated_at == now`.
    fn from_draft(id: Self::Id, draft: Self::Draft, now: DateTime<Utc>) -> Self;
    fn apply_patch(&mut self, patch: Self::Patch);

    fn updated_at(&self) -> DateTime<Utc>;
    fn set_updated_at(&mut self, at: DateTime<Utc>);
}

/// In-memory entity collection mirrored to one slot.
///
/// All state sits behind one async mutex that is held across the write-back,
/// so slot contents always reflect a prefix of the mutation sequence.
pub struct EntityStore<E: Entity, S: SlotStore> {
    slots: S,
    key: String,
    items: Mutex<Vec<E>>,
    latency: Latency,
}

impl<E: Entity, S: SlotStore> EntityStore<E, S> {
    /// Open a store, loading the collection from `key`.
    ///
    /// A missing slot is an empty collection. An unreadable slot is an error.
    pub async fn open(
        slots: S,
        key: impl Into<String>,
        latency: Latency,
    ) -> Result<Self, StorageError> {
        let key = key.into();
        let items: Vec<E> = load_collection(&slots, &key).await?;
        info!(kind = E::KIND, key = %key, count = items.len(), "Entity store opened");
        Ok(Self::with_items(slots, key, items, latency))
    }

    /// Build a store from injected initial state without reading the slot.
    pub fn with_items(slots: S, key: impl Into<String>, items: Vec<E>, latency: Latency) -> Self {
        Self {
            slots,
            key: key.into(),
            items: Mutex::new(items),
            latency,
        }
    }

    /// The slot key this store mirrors to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Access the underlying slot store.
    pub fn slots(&self) -> &S {
        &self.slots
    }

    /// All entities in insertion order.
    pub async fn get_all(&self) -> Vec<E> {
        self.latency.simulate().await;
        self.items.lock().await.clone()
    }

    /// Look up an entity. Unknown ids are `None`, not an error.
    pub async fn get_by_id(&self, id: E::Id) -> Option<E> {
        self.latency.simulate().await;
        self.items
            .lock()
            .await
            .iter()
            .find(|e| e.id() == id)
            .cloned()
    }

    /// Entities matching `predicate`, in insertion order.
    pub async fn filter(&self, predicate: impl Fn(&E) -> bool) -> Vec<E> {
        self.latency.simulate().await;
        self.items
            .lock()
            .await
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Create an entity with a fresh id and append it.
    pub async fn create(&self, draft: E::Draft) -> Result<Write<E>, StoreError> {
        self.latency.simulate().await;
        E::validate_draft(&draft)?;

        let mut items = self.items.lock().await;
        let mut id = E::new_id();
        while items.iter().any(|e| e.id() == id) {
            id = E::new_id();
        }

        let entity = E::from_draft(id, draft, Utc::now());
        items.push(entity.clone());
        debug!(kind = E::KIND, id = %id, "Entity created");

        let durability = self.persist(&items).await;
        Ok(Write {
            value: entity,
            durability,
        })
    }

    /// Merge `patch` onto an existing entity.
    ///
    /// Returns `None` for an unknown id. `updated_at` never moves backwards.
    pub async fn update(&self, id: E::Id, patch: E::Patch) -> Result<Option<Write<E>>, StoreError> {
        self.latency.simulate().await;
        E::validate_patch(&patch)?;

        let mut items = self.items.lock().await;
        let Some(entity) = items.iter_mut().find(|e| e.id() == id) else {
            debug!(kind = E::KIND, id = %id, "Update of unknown entity");
            return Ok(None);
        };

        let previous = entity.updated_at();
        entity.apply_patch(patch);
        entity.set_updated_at(Utc::now().max(previous));
        let updated = entity.clone();
        debug!(kind = E::KIND, id = %id, "Entity updated");

        let durability = self.persist(&items).await;
        Ok(Some(Write {
            value: updated,
            durability,
        }))
    }

    /// Remove an entity. The value is `true` if something was removed.
    pub async fn delete(&self, id: E::Id) -> Write<bool> {
        self.latency.simulate().await;

        let mut items = self.items.lock().await;
        let before = items.len();
        items.retain(|e| e.id() != id);
        if items.len() == before {
            return Write::persisted(false);
        }
        info!(kind = E::KIND, id = %id, "Entity deleted");

        let durability = self.persist(&items).await;
        Write {
            value: true,
            durability,
        }
    }

    /// Write the current collection to the slot again.
    ///
    /// Used to catch the slot up after a memory-only mutation.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let items = self.items.lock().await;
        save_collection(&self.slots, &self.key, items.as_slice()).await
    }

    async fn persist(&self, items: &[E]) -> Durability {
        match save_collection(&self.slots, &self.key, items).await {
            Ok(()) => Durability::Persisted,
            Err(err) => {
                warn!(
                    kind = E::KIND,
                    key = %self.key,
                    error = %err,
                    "Write-back failed; change kept in memory only"
                );
                Durability::MemoryOnly(err)
            }
        }
    }
}
