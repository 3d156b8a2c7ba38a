//! Store that keeps one pretty-printed JSON file per document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{DocumentStore, LocalQuery, SearchHits, StoreError};
use crate::models::EnrichedDocument;
use crate::utils::{sanitize_filename, write_atomic};

/// Writes `{dir}/{id}.json`. Writes go through a temporary file in the
/// same directory and are renamed into place.
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_filename(id)))
    }

    async fn load_all(&self) -> Result<Vec<EnrichedDocument>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<EnrichedDocument>(&raw) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable document")
                }
            }
        }
        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for JsonDirStore {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn prepare(&self, force_recreate: bool) -> Result<(), StoreError> {
        if force_recreate && self.dir.exists() {
            tracing::info!(dir = %self.dir.display(), "Removing existing documents");
            for doc in self.load_all().await? {
                self.delete(&doc.id).await?;
            }
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    async fn put(&self, id: &str, document: &EnrichedDocument) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(document)?;
        let target = self.path_for(id);

        tokio::task::spawn_blocking(move || write_atomic(&target, &json))
            .await
            .map_err(|e| std::io::Error::new(ErrorKind::Other, e))??;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<EnrichedDocument>, StoreError> {
        match tokio::fs::read(self.path_for(id)).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn search(&self, query: &serde_json::Value) -> Result<SearchHits, StoreError> {
        let query = LocalQuery::parse(query)?;
        let documents = self.load_all().await?;
        query.run(&documents)
    }

    async fn health(&self) -> Result<String, StoreError> {
        if !self.dir.is_dir() {
            return Ok(format!("missing ({})", self.dir.display()));
        }
        let count = self.load_all().await?.len();
        Ok(format!("green ({} documents in {})", count, self.dir.display()))
    }
}
