//! Persisted slot documents and write durability.
//!
//! Every store mirrors its collection into one slot as a versioned JSON
//! document. Mutations report whether the write-back reached the slot store
//! so callers can tell "applied in memory" apart from "durably persisted".

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StoreError};

/// Schema version written by this build.
pub const SLOT_SCHEMA_VERSION: u32 = 1;

/// The JSON document stored in a collection slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDocument<T> {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub items: Vec<T>,
}

impl<T: Serialize + DeserializeOwned> SlotDocument<T> {
    /// Wrap `items` in a current-version document and serialize it.
    pub fn encode(items: &[T]) -> Result<serde_json::Value, StorageError>
    where
        T: Clone,
    {
        let doc = SlotDocument {
            schema_version: SLOT_SCHEMA_VERSION,
            saved_at: Utc::now(),
            items: items.to_vec(),
        };
        serde_json::to_value(&doc).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Decode a slot value into its items.
    ///
    /// A bare JSON array is the unversioned legacy layout (schema 0).
    pub fn decode(key: &str, value: serde_json::Value) -> Result<Vec<T>, StorageError> {
        if value.is_array() {
            return serde_json::from_value(value)
                .map_err(|e| StorageError::Serialization(format!("slot '{key}': {e}")));
        }

        let found = value
            .get("schema_version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| {
                StorageError::Serialization(format!("slot '{key}': missing schema_version"))
            })?;
        let found = u32::try_from(found).unwrap_or(u32::MAX);
        if found > SLOT_SCHEMA_VERSION {
            return Err(StorageError::SchemaMismatch {
                key: key.to_string(),
                found,
                supported: SLOT_SCHEMA_VERSION,
            });
        }

        let doc: SlotDocument<T> = serde_json::from_value(value)
            .map_err(|e| StorageError::Serialization(format!("slot '{key}': {e}")))?;
        Ok(doc.items)
    }
}

/// Whether a mutation reached the slot store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Durability {
    Persisted,
    /// Applied in memory only; the slot still holds older state.
    MemoryOnly(StorageError),
}

/// Result of a successful in-memory mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Write<T> {
    pub value: T,
    pub durability: Durability,
}

impl<T> Write<T> {
    pub fn persisted(value: T) -> Self {
        Self {
            value,
            durability: Durability::Persisted,
        }
    }

    pub fn memory_only(value: T, error: StorageError) -> Self {
        Self {
            value,
            durability: Durability::MemoryOnly(error),
        }
    }

    pub fn is_durable(&self) -> bool {
        matches!(self.durability, Durability::Persisted)
    }

    /// The value, or `StoreError::Storage` if the write-back failed.
    ///
    /// The in-memory mutation has happened either way.
    pub fn durable(self) -> Result<T, StoreError> {
        match self.durability {
            Durability::Persisted => Ok(self.value),
            Durability::MemoryOnly(err) => Err(StoreError::Storage(err)),
        }
    }

    /// The value regardless of durability.
    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Write<U> {
        Write {
            value: f(self.value),
            durability: self.durability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_writes_current_version() {
        let value = SlotDocument::encode(&["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(value["schema_version"], json!(SLOT_SCHEMA_VERSION));
        assert_eq!(value["items"], json!(["a", "b"]));
        assert!(value["saved_at"].is_string());
    }

    #[test]
    fn test_decode_legacy_bare_array() {
        let items: Vec<u32> = SlotDocument::decode("k", json!([1, 2, 3])).unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_rejects_newer_schema() {
        let value = json!({"schema_version": 7, "saved_at": Utc::now(), "items": []});
        let err = SlotDocument::<u32>::decode("lexdesk.threads", value).unwrap_err();
        assert!(matches!(err, StorageError::SchemaMismatch { found: 7, .. }));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = SlotDocument::<u32>::decode("k", json!({"nope": true})).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn test_write_durability() {
        let ok = Write::persisted(5);
        assert!(ok.is_durable());
        assert_eq!(ok.durable().unwrap(), 5);

        let lost = Write::memory_only(6, StorageError::Backend("offline".into()));
        assert!(!lost.is_durable());
        assert_eq!(lost.clone().into_inner(), 6);
        assert!(matches!(lost.durable(), Err(StoreError::Storage(_))));
    }
}
