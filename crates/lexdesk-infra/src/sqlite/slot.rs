//! SQLite slot store implementation.
//!
//! Implements `SlotStore` from `lexdesk-core` using sqlx with split read/write pools.
//! Values are stored as JSON text and deserialized on read.

use chrono::{DateTime, Utc};
use lexdesk_core::storage::slot_store::SlotStore;
use lexdesk_types::error::StorageError;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SlotStore`.
#[derive(Clone)]
pub struct SqliteSlotStore {
    pool: DatabasePool,
}

/// Size and age of one stored slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotInfo {
    pub key: String,
    pub bytes: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SqliteSlotStore {
    /// Create a new slot store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Describe every slot whose key starts with `prefix`, ordered by key.
    pub async fn describe(&self, prefix: &str) -> Result<Vec<SlotInfo>, StorageError> {
        let rows = sqlx::query(
            "SELECT key, length(value) AS bytes, created_at, updated_at FROM slots \
             WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(backend)?;

        rows.iter().map(SlotInfoRow::from_row).map(|r| r?.into_info()).collect()
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SlotInfoRow {
    key: String,
    bytes: i64,
    created_at: String,
    updated_at: String,
}

impl SlotInfoRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, StorageError> {
        Ok(Self {
            key: row.try_get("key").map_err(backend)?,
            bytes: row.try_get("bytes").map_err(backend)?,
            created_at: row.try_get("created_at").map_err(backend)?,
            updated_at: row.try_get("updated_at").map_err(backend)?,
        })
    }

    fn into_info(self) -> Result<SlotInfo, StorageError> {
        Ok(SlotInfo {
            bytes: usize::try_from(self.bytes).unwrap_or_default(),
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            key: self.key,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn backend(e: sqlx::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// SlotStore implementation
// ---------------------------------------------------------------------------

impl SlotStore for SqliteSlotStore {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let row = sqlx::query("SELECT value FROM slots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(backend)?;

        match row {
            Some(row) => {
                let value_str: String = row.try_get("value").map_err(backend)?;
                let value: serde_json::Value = serde_json::from_str(&value_str).map_err(|e| {
                    StorageError::Serialization(format!("slot '{key}' holds invalid JSON: {e}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        let now = format_datetime(&Utc::now());
        let value_str = serde_json::to_string(value)
            .map_err(|e| StorageError::Serialization(format!("failed to serialize value: {e}")))?;

        sqlx::query(
            r#"INSERT INTO slots (key, value, created_at, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT (key) DO UPDATE
               SET value = excluded.value, updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(&value_str)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(backend)?;

        tracing::trace!(key, bytes = value_str.len(), "Slot saved");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM slots WHERE key = ?")
            .bind(key)
            .execute(&self.pool.writer)
            .await
            .map_err(backend)?;

        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        // substr comparison avoids LIKE wildcards in user-chosen namespaces.
        let rows = sqlx::query(
            "SELECT key FROM slots WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(backend)?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            let key: String = row.try_get("key").map_err(backend)?;
            keys.push(key);
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::{DatabasePool, database_url};
    use lexdesk_core::storage::keys::SlotKeys;
    use lexdesk_core::store::client::ClientStore;
    use lexdesk_core::latency::Latency;
    use lexdesk_types::client::NewClient;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url(dir.path(), "test.db");
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let store = SqliteSlotStore::new(test_pool().await);

        let value = serde_json::json!({"schema_version": 1, "items": [{"a": 1}]});
        store.save("lexdesk.clients", &value).await.unwrap();

        let got = store.load("lexdesk.clients").await.unwrap();
        assert_eq!(got, Some(value));
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let store = SqliteSlotStore::new(test_pool().await);
        assert!(store.load("lexdesk.nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_upserts_and_keeps_created_at() {
        let store = SqliteSlotStore::new(test_pool().await);

        store.save("k", &serde_json::json!(1)).await.unwrap();
        let before = store.describe("k").await.unwrap();
        store.save("k", &serde_json::json!([1, 2, 3])).await.unwrap();
        let after = store.describe("k").await.unwrap();

        assert_eq!(store.load("k").await.unwrap(), Some(serde_json::json!([1, 2, 3])));
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].created_at, before[0].created_at);
        assert!(after[0].updated_at >= before[0].updated_at);
        assert_eq!(after[0].bytes, "[1,2,3]".len());
    }

    #[tokio::test]
    async fn test_remove_and_remove_missing() {
        let store = SqliteSlotStore::new(test_pool().await);

        store.save("temp", &serde_json::json!("value")).await.unwrap();
        store.remove("temp").await.unwrap();
        assert!(store.load("temp").await.unwrap().is_none());

        // Should not error
        store.remove("temp").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_keys_by_prefix() {
        let store = SqliteSlotStore::new(test_pool().await);

        for key in ["firm_a.threads", "firm_a.clients", "firm_b.clients", "firm_a_x.clients"] {
            store.save(key, &serde_json::json!([])).await.unwrap();
        }

        let keys = store.list_keys("firm_a.").await.unwrap();
        assert_eq!(keys, vec!["firm_a.clients", "firm_a.threads"]);
        assert_eq!(store.list_keys("").await.unwrap().len(), 4);
        assert!(store.list_keys("%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json_is_serialization_error() {
        let pool = test_pool().await;
        let store = SqliteSlotStore::new(pool.clone());
        let now = Utc::now().to_rfc3339();
        sqlx::query("INSERT INTO slots (key, value, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind("broken")
            .bind("{not json")
            .bind(&now)
            .bind(&now)
            .execute(&pool.writer)
            .await
            .unwrap();

        let err = store.load("broken").await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_client_store_survives_reopen() {
        let pool = test_pool().await;
        let keys = SlotKeys::default();

        let first = ClientStore::open(
            SqliteSlotStore::new(pool.clone()),
            keys.clients(),
            Latency::none(),
        )
        .await
        .unwrap();
        let created = first
            .create(NewClient::named("Grace Hopper"))
            .await
            .unwrap()
            .durable()
            .unwrap();

        let second = ClientStore::open(SqliteSlotStore::new(pool), keys.clients(), Latency::none())
            .await
            .unwrap();
        assert_eq!(second.get_by_id(created.id).await, Some(created));
    }
}
