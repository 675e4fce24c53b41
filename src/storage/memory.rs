//! In-process blob store, used by tests and `STORAGE_BACKEND=memory`

use super::BlobStore;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, overwrite: bool) -> Result<()> {
        match self.blobs.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if !overwrite {
                    return Err(anyhow!("Blob '{key}' already exists"));
                }
                entry.insert(bytes);
            }
            Entry::Vacant(entry) => {
                entry.insert(bytes);
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.blobs.remove(key);
        Ok(())
    }
}
