use crate::error::Result;
use crate::storage::Storage;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Keyed JSON documents, overwritten on every save.
pub struct SnapshotStore<'a> {
    storage: &'a Storage,
}

impl<'a> SnapshotStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save<T: Serialize>(&self, key: &str, kind: &str, value: &T) -> Result<()> {
        let document = serde_json::to_string(value)?;
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT OR REPLACE INTO snapshots (key, kind, document, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, kind, document, Utc::now().timestamp()],
        )?;

        tracing::debug!("Saved {} snapshot '{}'", kind, key);
        Ok(())
    }

    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let conn = self.storage.get_connection().await;

        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM snapshots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(document) => Ok(Some(serde_json::from_str(&document)?)),
            None => Ok(None),
        }
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let conn = self.storage.get_connection().await;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM snapshots WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let conn = self.storage.get_connection().await;
        conn.execute("DELETE FROM snapshots WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        value: u64,
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let storage = Storage::in_memory().await.unwrap();
        let store = SnapshotStore::new(&storage);

        assert!(store.load::<Doc>("pool").await.unwrap().is_none());

        store.save("pool", "test", &Doc { value: 1 }).await.unwrap();
        store.save("pool", "test", &Doc { value: 2 }).await.unwrap();

        assert_eq!(store.load::<Doc>("pool").await.unwrap(), Some(Doc { value: 2 }));
        assert!(store.exists("pool").await.unwrap());

        store.delete("pool").await.unwrap();
        assert!(!store.exists("pool").await.unwrap());
    }

    #[tokio::test]
    async fn test_persists_to_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("onepool.db");

        {
            let storage = Storage::new(&db_path).await.unwrap();
            SnapshotStore::new(&storage)
                .save("pool", "test", &Doc { value: 7 })
                .await
                .unwrap();
        }

        let storage = Storage::new(&db_path).await.unwrap();
        let doc = SnapshotStore::new(&storage).load::<Doc>("pool").await.unwrap();
        assert_eq!(doc, Some(Doc { value: 7 }));
    }

    #[tokio::test]
    async fn test_unusable_data_dir_is_io_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = Storage::new(&blocker.join("onepool.db")).await;
        assert!(matches!(result, Err(crate::CoreError::Io(_))));
    }
}
