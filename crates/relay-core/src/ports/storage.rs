//! Scoped key-value storage port.
//!
//! Trust records and saved variable inputs persist through this port. The
//! backing store is partitioned by [`StorageScope`] so that clearing a scope
//! (e.g. closing a workspace) also invalidates everything persisted under it.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::StorageScope;

/// Errors from the storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend failed to read or write.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Scope-partitioned string key-value storage.
///
/// Values are opaque to the backend; callers serialize their own documents.
#[async_trait]
pub trait ScopedStorage: Send + Sync {
    /// Read a value, or `None` if the key has never been written.
    async fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, scope: StorageScope, key: &str, value: String) -> Result<(), StorageError>;

    /// Remove a single key. Removing an absent key is a no-op.
    async fn remove(&self, scope: StorageScope, key: &str) -> Result<(), StorageError>;

    /// Remove every key in a scope.
    async fn clear(&self, scope: StorageScope) -> Result<(), StorageError>;
}

/// In-memory storage for tests and contexts without persistence.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<(StorageScope, String), String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScopedStorage for MemoryStorage {
    async fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(scope, key.to_string())).cloned())
    }

    async fn set(&self, scope: StorageScope, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        entries.insert((scope, key.to_string()), value);
        Ok(())
    }

    async fn remove(&self, scope: StorageScope, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        entries.remove(&(scope, key.to_string()));
        Ok(())
    }

    async fn clear(&self, scope: StorageScope) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        entries.retain(|(entry_scope, _), _| *entry_scope != scope);
        Ok(())
    }
}
