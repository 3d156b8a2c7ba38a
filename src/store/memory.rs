//! In-memory store for tests and dry runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DocumentStore, LocalQuery, SearchHits, StoreError};
use crate::models::EnrichedDocument;

/// Documents held in a map behind a lock. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, EnrichedDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Stored ids, sorted.
    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.documents.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn prepare(&self, force_recreate: bool) -> Result<(), StoreError> {
        if force_recreate {
            self.documents.write().await.clear();
        }
        Ok(())
    }

    async fn put(&self, id: &str, document: &EnrichedDocument) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .insert(id.to_string(), document.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<EnrichedDocument>, StoreError> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.documents.write().await.remove(id).is_some())
    }

    async fn search(&self, query: &serde_json::Value) -> Result<SearchHits, StoreError> {
        let query = LocalQuery::parse(query)?;
        let documents = self.documents.read().await;
        query.run(documents.values())
    }

    async fn health(&self) -> Result<String, StoreError> {
        Ok(format!("green ({} documents)", self.len().await))
    }
}
