//! In-memory storage.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{LocalStore, StorageError};

/// Process-local storage.
///
/// Clones share the same slots, so a clone handed to a second
/// synchronizer behaves like a page reload over the same browser storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a slot, without going through the trait.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.slots.read().await.get(key).cloned()
    }
}

impl LocalStore for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key).await)
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.slots.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
