//! SQLite blob store: a single `blobs(key, value)` table

use super::BlobStore;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;
use sqlite::{Connection, State};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct SqliteBlobStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteBlobStore {
    /// Open the database file (use `:memory:` for a throwaway store)
    pub fn open(path: &str) -> Result<Self> {
        let connection = sqlite::open(path)?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )?;
        info!("Opened SQLite blob store at {path}");
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Run a blocking closure against the connection off the async runtime
    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let guard = connection
                .lock()
                .map_err(|_| anyhow!("SQLite connection mutex poisoned"))?;
            f(&guard)
        })
        .await?
    }
}

fn select_value(connection: &Connection, key: &str) -> Result<Option<Vec<u8>>> {
    let mut statement = connection.prepare("SELECT value FROM blobs WHERE key = ?")?;
    statement.bind((1, key))?;
    if let State::Row = statement.next()? {
        Ok(Some(statement.read::<Vec<u8>, _>(0usize)?))
    } else {
        Ok(None)
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let key = key.to_string();
        self.with_connection(move |conn| select_value(conn, &key)).await
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, overwrite: bool) -> Result<()> {
        let key = key.to_string();
        self.with_connection(move |conn| {
            if !overwrite && select_value(conn, &key)?.is_some() {
                return Err(anyhow!("Blob '{key}' already exists"));
            }
            let mut statement = conn.prepare(
                "INSERT INTO blobs (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            )?;
            statement.bind((1, key.as_str()))?;
            statement.bind((2, &bytes[..]))?;
            while statement.next()? != State::Done {}
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.with_connection(move |conn| {
            let mut statement = conn.prepare("DELETE FROM blobs WHERE key = ?")?;
            statement.bind((1, key.as_str()))?;
            while statement.next()? != State::Done {}
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_round_trip() {
        let store = SqliteBlobStore::open(":memory:").unwrap();

        assert!(store.get("a").await.unwrap().is_none());
        store.put("a", b"first".to_vec(), false).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().unwrap(), b"first");

        assert!(store.put("a", b"second".to_vec(), false).await.is_err());
        store.put("a", b"second".to_vec(), true).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().unwrap(), b"second");

        store.delete("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
    }
}
