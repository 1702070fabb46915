//! In-memory object store backend using DashMap.
//!
//! Documents are kept in process memory and lost on restart. Intended for
//! tests and local development; the trait surface matches the durable
//! backends exactly.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{ObjectStore, StoreError};

/// In-memory object store backend.
pub struct MemoryObjectStore {
    /// Namespace prefix applied to every key, mirroring a bucket name
    namespace: String,
    documents: DashMap<String, serde_json::Value>,
}

impl MemoryObjectStore {
    /// Create an empty store scoped to the given namespace.
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            documents: DashMap::new(),
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}/{}", self.namespace, key)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, document: serde_json::Value) -> Result<(), StoreError> {
        self.documents.insert(self.namespaced(key), document);
        tracing::debug!(key = %key, "Document written");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<serde_json::Value, StoreError> {
        self.documents
            .get(&self.namespaced(key))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let full_prefix = self.namespaced(prefix);
        let strip = format!("{}/", self.namespace);
        let mut keys: Vec<String> = self
            .documents
            .iter()
            .filter(|entry| entry.key().starts_with(&full_prefix))
            .map(|entry| entry.key()[strip.len()..].to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.documents.remove(&self.namespaced(key));
        Ok(())
    }
}
