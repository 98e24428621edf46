//! JSON file storage implementation.
//!
//! Stores each key as `<key>.json` under a root directory (by default
//! `.lessonpath`). Writes go through a temp file and a rename so a crash
//! mid-write leaves the previous value intact.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use super::{KeyValueStore, Result, StorageError};

/// File-based key-value backend.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Create storage, creating the root directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key.starts_with('.')
            || key.contains(|c: char| c == '/' || c == '\\')
        {
            return Err(StorageError::Other(format!("invalid key: {:?}", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value.as_bytes()).await?;
        fs::rename(&tmp, &path).await?;
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        fs::remove_file(&path).await.or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("state")).await.unwrap();

        store.set("progress", r#"{"current":"intro"}"#).await.unwrap();
        let value = store.get("progress").await.unwrap();
        assert_eq!(value.as_deref(), Some(r#"{"current":"intro"}"#));
        assert!(dir.path().join("state").join("progress.json").exists());
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();
        assert!(store.get("progress").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path()).await.unwrap();

        store.set("progress", "{}").await.unwrap();
        store.remove("progress").await.unwrap();
        store.remove("progress").await.unwrap();
        assert!(store.get("progress").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path()).await.unwrap();

        assert!(matches!(
            store.set("../escape", "{}").await,
            Err(StorageError::Other(_))
        ));
        assert!(store.get("").await.is_err());
    }
}
