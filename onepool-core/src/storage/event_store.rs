use crate::error::Result;
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: i64,
    pub stream: String,
    pub kind: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

pub struct EventStore<'a> {
    storage: &'a Storage,
}

impl<'a> EventStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn append<T: Serialize>(&self, stream: &str, kind: &str, event: &T) -> Result<i64> {
        let payload = serde_json::to_string(event)?;
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT INTO events (stream, kind, payload, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![stream, kind, payload, Utc::now().timestamp()],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Most recent `limit` events of a stream, oldest first.
    pub async fn recent(&self, stream: &str, limit: usize) -> Result<Vec<EventRecord>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT seq, stream, kind, payload, created_at FROM events
             WHERE stream = ?1 ORDER BY seq DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![stream, limit as i64], |row| {
            Ok(EventRecord {
                seq: row.get(0)?,
                stream: row.get(1)?,
                kind: row.get(2)?,
                payload: row.get(3)?,
                created_at: DateTime::from_timestamp(row.get(4)?, 0).unwrap_or_else(Utc::now),
            })
        })?;

        let mut events = Vec::new();
        for event in rows {
            events.push(event?);
        }
        events.reverse();

        Ok(events)
    }

    pub async fn count(&self, stream: &str) -> Result<u64> {
        let conn = self.storage.get_connection().await;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE stream = ?1",
            params![stream],
            |row| row.get(0),
        )?;

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_read_back_in_order() {
        let storage = Storage::in_memory().await.unwrap();
        let store = EventStore::new(&storage);

        for i in 0..5u64 {
            store.append("pool", "tick", &i).await.unwrap();
        }
        store.append("other", "tick", &99u64).await.unwrap();

        let events = store.recent("pool", 3).await.unwrap();
        let payloads: Vec<&str> = events.iter().map(|e| e.payload.as_str()).collect();
        assert_eq!(payloads, vec!["2", "3", "4"]);
        assert_eq!(store.count("pool").await.unwrap(), 5);
        assert_eq!(store.count("other").await.unwrap(), 1);
    }
}
