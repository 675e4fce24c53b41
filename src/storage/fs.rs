//! Filesystem blob store: one file per key under a root directory

use super::BlobStore;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (and create if needed) the root directory
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create storage directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(encode_key(key))
    }
}

/// Map a key to a single safe file name.
///
/// Bytes outside `[A-Za-z0-9._-]` become `%XX`, and a leading dot is escaped
/// too, so keys can neither traverse directories nor collide.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, byte) in key.bytes().enumerate() {
        let keep = byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-') || (byte == b'.' && i > 0);
        if keep {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow!("Failed to read blob {}: {e}", path.display())),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, overwrite: bool) -> Result<()> {
        let path = self.path_for(key);
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = match options.open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(anyhow!("Blob '{key}' already exists"));
            }
            Err(e) => return Err(anyhow!("Failed to open blob {}: {e}", path.display())),
        };
        file.write_all(&bytes).await?;
        file.flush().await?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow!("Failed to delete blob {}: {e}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("session-abc.json"), "session-abc.json");
        assert_eq!(encode_key("a/b"), "a%2Fb");
        assert_eq!(encode_key("../x"), "%2E.%2Fx");
        assert_eq!(encode_key("a:1|chat"), "a%3A1%7Cchat");
    }

    #[tokio::test]
    async fn test_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path().join("blobs")).await.unwrap();

        assert!(store.get("k.json").await.unwrap().is_none());
        store.put("k.json", b"[1,2]".to_vec(), false).await.unwrap();
        assert_eq!(store.get("k.json").await.unwrap().unwrap(), b"[1,2]");
        assert!(store.root().join("k.json").exists());

        assert!(store.put("k.json", b"[]".to_vec(), false).await.is_err());
        store.put("k.json", b"[]".to_vec(), true).await.unwrap();
        assert_eq!(store.get("k.json").await.unwrap().unwrap(), b"[]");

        store.delete("k.json").await.unwrap();
        store.delete("k.json").await.unwrap();
        assert!(store.get("k.json").await.unwrap().is_none());
    }
}
