// src/storage.rs
//! Filesystem-backed artifact store. Compiled PDFs live under opaque uuid
//! keys; the `ResumeVersion` row only ever holds the key.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.pdf", key))
    }

    /// Store bytes under a fresh opaque key
    pub async fn put(&self, bytes: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create artifact root: {}", self.root.display()))?;

        let key = Uuid::new_v4().to_string();
        let path = self.path_for(&key);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write artifact: {}", path.display()))?;

        info!("Stored artifact {} ({} bytes)", key, bytes.len());
        Ok(key)
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read artifact: {}", path.display()))
    }

    /// Best-effort delete of a superseded artifact
    pub async fn remove(&self, key: &str) {
        let path = self.path_for(key);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Failed to remove superseded artifact {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let dir = std::env::temp_dir().join(format!("artifacts-{}", Uuid::new_v4()));
        let store = ArtifactStore::new(dir.clone());

        let key = store.put(b"%PDF-1.5 test").await.unwrap();
        let bytes = store.get(&key).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.5 test");

        store.remove(&key).await;
        assert!(store.get(&key).await.is_err());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_keys_are_opaque_and_unique() {
        let dir = std::env::temp_dir().join(format!("artifacts-{}", Uuid::new_v4()));
        let store = ArtifactStore::new(dir.clone());

        let a = store.put(b"one").await.unwrap();
        let b = store.put(b"one").await.unwrap();
        assert_ne!(a, b);

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
