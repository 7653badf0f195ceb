//! File-backed storage
//!
//! Keeps all entries in a single JSON object. Every write rewrites the file
//! through a temporary sibling and a rename, so a crash never leaves a
//! half-written state file behind.

use super::StorageLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// JSON file storage
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    /// In-memory mirror of the file; the lock also serializes writers.
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the state file at `path`
    ///
    /// A missing file is treated as empty. An unreadable or corrupt file is
    /// an error rather than being silently discarded.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Corrupt state file '{}'", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read '{}'", path.display()))
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create '{}'", parent.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(entries).context("Failed to encode state")?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write '{}'", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace '{}'", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl StorageLayer for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_none() {
            return Ok(false);
        }
        self.persist(&entries).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let storage = FileStorage::open(&path).await.unwrap();
        storage.set("token", "persisted").await.unwrap();
        storage.set("theme", "dark").await.unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).await.unwrap();
        assert_eq!(reopened.get("token").await.unwrap().as_deref(), Some("persisted"));
        assert_eq!(reopened.get("theme").await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_remove_persists_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let storage = FileStorage::open(&path).await.unwrap();
        storage.set("token", "gone-soon").await.unwrap();
        assert!(storage.remove("token").await.unwrap());
        assert!(!storage.remove("token").await.unwrap());

        let reopened = FileStorage::open(&path).await.unwrap();
        assert_eq!(reopened.get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(FileStorage::open(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_file_is_empty_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "").unwrap();

        let storage = FileStorage::open(&path).await.unwrap();
        assert_eq!(storage.get("token").await.unwrap(), None);
    }
}
