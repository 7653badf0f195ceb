//! In-memory storage implementation using moka

use super::StorageLayer;
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;

/// Upper bound on stored keys; the client only ever uses a handful
const DEFAULT_MAX_CAPACITY: u64 = 1_000;

/// In-memory storage
///
/// Entries never expire; they live until removed or the process exits.
pub struct MemoryStorage {
    entries: Cache<String, String>,
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("entry_count", &self.entries.entry_count())
            .finish()
    }
}

impl MemoryStorage {
    /// Create an empty in-memory storage
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().max_capacity(DEFAULT_MAX_CAPACITY).build(),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageLayer for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).await)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string()).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).await.is_some())
    }
}
