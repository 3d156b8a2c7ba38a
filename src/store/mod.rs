//! External document store.
//!
//! The orchestrator only ever calls [`DocumentStore::put`]; the other
//! operations back the command line. `put` overwrites, so submitting the
//! same id twice leaves one copy.

mod elasticsearch;
mod json_dir;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use elasticsearch::ElasticsearchStore;
pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;

use crate::config::{StoreKind, StoreSettings};
use crate::extraction::normalize::fold;
use crate::models::EnrichedDocument;

/// Errors returned by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredHit {
    pub id: String,
    pub score: Option<f64>,
    pub source: serde_json::Value,
}

/// Search results with the total match count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHits {
    pub total: u64,
    pub hits: Vec<StoredHit>,
}

/// Persistence for enriched documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Create whatever schema the backend needs, dropping existing data
    /// first when `force_recreate` is set.
    async fn prepare(&self, _force_recreate: bool) -> Result<(), StoreError> {
        Ok(())
    }

    /// Store `document` under `id`, replacing any previous copy.
    async fn put(&self, id: &str, document: &EnrichedDocument) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<EnrichedDocument>, StoreError>;

    /// Remove `id`. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn search(&self, query: &serde_json::Value) -> Result<SearchHits, StoreError>;

    /// Backend health as a short status string.
    async fn health(&self) -> Result<String, StoreError>;
}

/// Build the store selected in settings.
pub fn build_store(settings: &StoreSettings) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let store: Arc<dyn DocumentStore> = match settings.kind {
        StoreKind::Elasticsearch => Arc::new(ElasticsearchStore::new(
            &settings.url,
            &settings.index,
            settings.timeout(),
        )?),
        StoreKind::Json => Arc::new(JsonDirStore::new(&settings.dir)),
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::debug!(backend = store.name(), "Document store ready");
    Ok(store)
}

/// Query understood by the local backends: `{"q": "term", "size": 10}`.
/// A missing or empty `q` matches everything.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocalQuery {
    term: Option<String>,
    size: usize,
}

impl LocalQuery {
    const DEFAULT_SIZE: usize = 10;

    pub(crate) fn parse(query: &serde_json::Value) -> Result<Self, StoreError> {
        let object = query
            .as_object()
            .ok_or_else(|| StoreError::Unsupported("query must be a JSON object".into()))?;
        if let Some(key) = object.keys().find(|k| *k != "q" && *k != "size") {
            return Err(StoreError::Unsupported(format!(
                "query field '{}' needs the elasticsearch backend",
                key
            )));
        }
        let term = object
            .get("q")
            .and_then(|q| q.as_str())
            .map(fold)
            .filter(|q| !q.trim().is_empty());
        let size = object
            .get("size")
            .and_then(|s| s.as_u64())
            .map(|s| s as usize)
            .unwrap_or(Self::DEFAULT_SIZE);
        Ok(Self { term, size })
    }

    /// Number of term occurrences in the searchable fields, or `None` when
    /// the document does not match.
    fn score(&self, document: &EnrichedDocument) -> Option<f64> {
        let Some(term) = &self.term else {
            return Some(1.0);
        };
        let count: usize = [&document.title, &document.author, &document.full_text]
            .iter()
            .map(|field| fold(field).matches(term.as_str()).count())
            .sum();
        (count > 0).then_some(count as f64)
    }

    /// Rank `documents` against this query.
    pub(crate) fn run<'a>(
        &self,
        documents: impl IntoIterator<Item = &'a EnrichedDocument>,
    ) -> Result<SearchHits, StoreError> {
        let mut scored: Vec<(f64, &EnrichedDocument)> = documents
            .into_iter()
            .filter_map(|doc| self.score(doc).map(|score| (score, doc)))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));

        let total = scored.len() as u64;
        let hits = scored
            .into_iter()
            .take(self.size)
            .map(|(score, doc)| {
                Ok(StoredHit {
                    id: doc.id.clone(),
                    score: Some(score),
                    source: serde_json::to_value(doc)?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(SearchHits { total, hits })
    }
}
