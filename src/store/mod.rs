//! Durable object store capability.
//!
//! Event and workflow records are whole JSON documents addressed by key
//! (`events/{event_id}.json`, `workflow_log/{run_id}.json`). The store is
//! the single source of truth: the log managers read-modify-write the full
//! record on every mutation and keep no cross-call cache, so they survive
//! process restarts. The read-then-write cycle is not compare-and-swap
//! protected; at most one writer per key is assumed.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::StoreConfig;

mod memory;

pub use memory::MemoryObjectStore;

/// Errors that can occur during object store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document exists at the requested key
    #[error("no document at key: {0}")]
    NotFound(String),

    /// Document could not be serialized or deserialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store is temporarily unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Store operation exceeded the capability's deadline
    #[error("store operation timed out: {0}")]
    Timeout(String),
}

/// Whole-document JSON storage addressed by key.
///
/// Implementations wrap an external durable store (S3-style bucket, local
/// filesystem, memory for tests). Each `put` replaces the complete document;
/// there is no partial update or native append.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write the complete document at `key`, replacing any existing one.
    async fn put(&self, key: &str, document: serde_json::Value) -> Result<(), StoreError>;

    /// Read the document at `key`.
    async fn get(&self, key: &str) -> Result<serde_json::Value, StoreError>;

    /// List all keys under the given prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Remove the document at `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Whether a document exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Create an object store backend based on configuration.
///
/// Returns the implementation selected by the `backend` setting:
/// - `"memory"` (default): a [`MemoryObjectStore`]
///
/// Unknown backend names fall back to memory with a warning rather than
/// failing startup.
pub fn create_object_store(settings: &StoreConfig) -> Arc<dyn ObjectStore> {
    match settings.backend.as_str() {
        "memory" => {
            tracing::info!(
                backend = "memory",
                namespace = %settings.namespace,
                "Creating memory object store"
            );
            Arc::new(MemoryObjectStore::new(&settings.namespace))
        }
        other => {
            tracing::warn!(
                backend = %other,
                "Unknown object store backend, falling back to memory"
            );
            Arc::new(MemoryObjectStore::new(&settings.namespace))
        }
    }
}
