//! Client-side storage
//!
//! Key/value persistence for the small amount of state the client keeps
//! between runs: the credential token and the theme preference.
//! It supports:
//! - In-memory storage (moka) - state is lost when the process exits
//! - File storage - a JSON object on disk, default for the CLI
//!
//! Values are opaque, unversioned strings.
//!
//! # Usage
//!
//! ```rust,ignore
//! use nihongo_coach::storage::{create_storage, StorageLayer, keys};
//! use nihongo_coach::config::StorageConfig;
//!
//! let storage = create_storage(&StorageConfig::default()).await?;
//! storage.set(keys::THEME, "dark").await?;
//! ```

pub mod file;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{StorageConfig, StorageDriver};

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Fixed storage keys
pub mod keys {
    /// Credential token
    pub const TOKEN: &str = "token";
    /// Theme preference (`"dark"` / `"light"`)
    pub const THEME: &str = "theme";
}

/// Storage layer trait
#[async_trait]
pub trait StorageLayer: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Returns `true` if something was removed;
    /// removing an absent key is a no-op.
    async fn remove(&self, key: &str) -> Result<bool>;
}

/// Unified storage enum for runtime driver selection
#[derive(Debug)]
pub enum Storage {
    /// In-memory storage using moka
    Memory(MemoryStorage),
    /// JSON file on disk
    File(FileStorage),
}

#[async_trait]
impl StorageLayer for Storage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Storage::Memory(storage) => storage.get(key).await,
            Storage::File(storage) => storage.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Storage::Memory(storage) => storage.set(key, value).await,
            Storage::File(storage) => storage.set(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        match self {
            Storage::Memory(storage) => storage.remove(key).await,
            Storage::File(storage) => storage.remove(key).await,
        }
    }
}

/// Create a storage instance based on configuration
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<Storage>> {
    match config.driver {
        StorageDriver::Memory => Ok(Arc::new(Storage::Memory(MemoryStorage::new()))),
        StorageDriver::File => {
            let storage = FileStorage::open(&config.path).await?;
            Ok(Arc::new(Storage::File(storage)))
        }
    }
}
