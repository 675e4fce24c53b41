//! # Blob Storage
//!
//! Key/value blob store behind conversation logs, analytics records and
//! export artifacts. A missing key is `Ok(None)`; every other failure is an
//! error and must propagate.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add SQLite backend
//! - 1.0.0: Initial release with memory and filesystem backends

pub mod fs;
pub mod memory;
pub mod sqlite;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;
pub use sqlite::SqliteBlobStore;

use crate::core::{Config, StorageBackend};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch a blob; `None` when the key does not exist
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a blob. With `overwrite = false` an existing key is an error.
    async fn put(&self, key: &str, bytes: Vec<u8>, overwrite: bool) -> Result<()>;

    /// Remove a blob; deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Key of a session's message log
pub fn session_log_key(session_id: &str) -> String {
    format!("session-{session_id}.json")
}

/// Key of a session's persisted analytics record
pub fn session_analytics_key(session_id: &str) -> String {
    format!("session-{session_id}-analytics.json")
}

/// Key of an export artifact. Downloads only ever read under this prefix.
pub fn export_key(file_name: &str) -> String {
    format!("exports/{file_name}")
}

/// Read and decode a JSON blob, `None` when missing
pub async fn read_json<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(bytes) => {
            let value = serde_json::from_slice(&bytes)
                .with_context(|| format!("Corrupt JSON in blob '{key}'"))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Encode a value as JSON and overwrite the blob
pub async fn write_json<T: Serialize + Sync>(store: &dyn BlobStore, key: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    store.put(key, bytes, true).await
}

/// Open the backend selected in the configuration
pub async fn open_store(config: &Config) -> Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config.storage_backend {
        StorageBackend::Memory => Arc::new(MemoryBlobStore::new()),
        StorageBackend::Fs => Arc::new(FsBlobStore::open(&config.storage_path).await?),
        StorageBackend::Sqlite => Arc::new(SqliteBlobStore::open(&config.database_path)?),
    };
    Ok(store)
}
