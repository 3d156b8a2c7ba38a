//! Batch ingestion of work items.
//!
//! Items are processed in fixed-size batches. Within a batch every item
//! runs as its own task behind a counting semaphore; the next batch starts
//! only after the current one has drained. Outcomes flow back to the
//! control loop, which is the only writer of [`BatchStats`].
//!
//! Per item: acquire the PDF (download into the cache unless already
//! there), validate and extract text and metadata, extract entities,
//! assemble the [`EnrichedDocument`](crate::models::EnrichedDocument) and
//! submit it to the store. PDF and entity work is blocking and runs on the
//! blocking pool under the configured extraction ceiling.

mod assemble;
mod error;
mod stats;

pub use assemble::{enrich, year_in, Extraction, UNKNOWN_AUTHOR};
pub use error::{Disposition, IngestError};
pub use stats::{BatchStats, ItemOutcome, PipelineEvent, RunSummary, MAX_DISPLAYED_ERRORS};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::config::{PipelineSettings, Settings};
use crate::extraction::EntityExtractor;
use crate::models::{PdfLocation, WorkItem};
use crate::pdf::{PdfError, TextExtractor};
use crate::reference::ReferenceData;
use crate::services::download::{Acquisition, DownloadError, Downloader};
use crate::services::manifest::{self, ManifestError};
use crate::store::DocumentStore;

/// Parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub batch_size: usize,
    pub max_workers: usize,
    /// Recreate the store's index before the first batch.
    pub force_reindex: bool,
    /// Ignore the manifest and ingest only PDFs already in the PDF directory.
    pub local_only: bool,
    /// Process at most this many items.
    pub limit: Option<usize>,
}

impl RunOptions {
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            batch_size: settings.batch_size,
            max_workers: settings.max_workers,
            force_reindex: false,
            local_only: false,
            limit: None,
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_settings(&PipelineSettings::default())
    }
}

/// Cooperative cancellation, checked between batches. A batch already in
/// flight always drains.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// State shared by every worker task.
struct Shared {
    extractor: TextExtractor,
    engine: EntityExtractor,
    downloader: Downloader,
    store: Arc<dyn DocumentStore>,
    pdf_dir: PathBuf,
    min_document_chars: usize,
    extraction_timeout: Duration,
}

type EventSender = mpsc::Sender<PipelineEvent>;

/// Drives work items through acquisition, extraction and submission.
pub struct Pipeline {
    shared: Arc<Shared>,
    manifest: PathBuf,
    events: Option<EventSender>,
}

impl Pipeline {
    pub fn new(
        settings: &Settings,
        reference: Arc<ReferenceData>,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, DownloadError> {
        let downloader = Downloader::new(
            settings.pipeline.download_timeout(),
            &settings.pipeline.user_agent,
        )?
        .with_max_bytes(settings.pdf.max_file_size);
        Ok(Self {
            shared: Arc::new(Shared {
                extractor: TextExtractor::from_settings(&settings.pdf),
                engine: EntityExtractor::new(reference, settings.extraction.clone()),
                downloader,
                store,
                pdf_dir: settings.pdf_dir.clone(),
                min_document_chars: settings.pipeline.min_document_chars,
                extraction_timeout: settings.pdf.extraction_timeout(),
            }),
            manifest: settings.manifest.clone(),
            events: None,
        })
    }

    /// Send progress events to `tx`. Without a sender no events are built.
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn downloader(&self) -> &Downloader {
        &self.shared.downloader
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.shared.store
    }

    /// Collect work items from the manifest (or the PDF directory) and run
    /// them.
    pub async fn ingest(
        &self,
        options: &RunOptions,
        cancel: &CancelFlag,
    ) -> Result<RunSummary, ManifestError> {
        let items =
            manifest::collect_work_items(&self.manifest, &self.shared.pdf_dir, options.local_only)
                .await?;
        Ok(self.run(items, options, cancel).await)
    }

    /// Process `items` batch by batch. Never fails: every item ends up
    /// counted as processed, skipped or errored, unless the run is
    /// cancelled before its batch starts.
    pub async fn run(
        &self,
        mut items: Vec<WorkItem>,
        options: &RunOptions,
        cancel: &CancelFlag,
    ) -> RunSummary {
        let started = Instant::now();
        let downloads_before = self.shared.downloader.download_count();

        if let Some(limit) = options.limit {
            items.truncate(limit);
        }
        let batch_size = options.batch_size.max(1);
        let max_workers = options.max_workers.max(1);
        let batches = items.len().div_ceil(batch_size);
        let mut stats = BatchStats::new(items.len());

        if let Err(e) = self.shared.store.prepare(options.force_reindex).await {
            tracing::warn!(
                store = self.shared.store.name(),
                error = %e,
                "Failed to prepare store, continuing"
            );
        }

        tracing::info!(
            items = stats.total,
            batches,
            batch_size,
            max_workers,
            "Starting ingestion run"
        );
        self.emit(PipelineEvent::RunStarted {
            total_items: stats.total,
            batches,
        })
        .await;

        let mut cancelled = false;
        let mut pending = items.into_iter();
        for batch in 1..=batches {
            if cancel.is_cancelled() {
                tracing::warn!(batch, batches, "Run cancelled before batch");
                cancelled = true;
                break;
            }
            let chunk: Vec<WorkItem> = pending.by_ref().take(batch_size).collect();
            self.run_batch(batch, chunk, max_workers, &mut stats).await;
        }

        let summary = RunSummary {
            elapsed: started.elapsed(),
            downloads: self.shared.downloader.download_count() - downloads_before,
            cancelled,
            stats,
        };
        tracing::info!(
            processed = summary.stats.processed,
            skipped = summary.stats.skipped,
            errors = summary.stats.errors,
            downloads = summary.downloads,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Ingestion run finished"
        );
        summary
    }

    async fn run_batch(
        &self,
        batch: usize,
        chunk: Vec<WorkItem>,
        max_workers: usize,
        stats: &mut BatchStats,
    ) {
        tracing::debug!(batch, items = chunk.len(), "Starting batch");
        self.emit(PipelineEvent::BatchStarted {
            batch,
            items: chunk.len(),
        })
        .await;

        let before = (stats.processed, stats.errors, stats.skipped);
        let semaphore = Arc::new(Semaphore::new(max_workers));
        let mut tasks = JoinSet::new();
        let mut identifiers = HashMap::new();

        for item in chunk {
            let identifier = item.identifier();
            let shared = Arc::clone(&self.shared);
            let semaphore = Arc::clone(&semaphore);
            let events = self.events.clone();
            let label = identifier.clone();

            let handle = tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        if let Some(tx) = &events {
                            let _ = tx
                                .send(PipelineEvent::ItemStarted {
                                    identifier: label.clone(),
                                })
                                .await;
                        }
                        process_item(&shared, &item, &label, events.as_ref()).await
                    }
                    Err(_) => Err(IngestError::Worker("worker pool closed".into())),
                };
                match result {
                    Ok(id) => ItemOutcome::Submitted { id },
                    Err(e) => {
                        match e.disposition() {
                            Disposition::Skipped => {
                                tracing::info!(item = %label, reason = %e, "Skipped item")
                            }
                            Disposition::Failed => {
                                tracing::warn!(item = %label, error = %e, "Item failed")
                            }
                        }
                        ItemOutcome::from(e)
                    }
                }
            });
            identifiers.insert(handle.id(), identifier);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (identifier, outcome) = match joined {
                Ok((task_id, outcome)) => (identifiers.remove(&task_id), outcome),
                Err(e) => {
                    tracing::error!(error = %e, "Worker task did not finish");
                    let outcome = ItemOutcome::from(IngestError::Worker(e.to_string()));
                    (identifiers.remove(&e.id()), outcome)
                }
            };
            let identifier = identifier.unwrap_or_else(|| "<unknown item>".to_string());
            stats.record(&identifier, &outcome);
            self.emit(PipelineEvent::finished(identifier, &outcome)).await;
        }

        self.emit(PipelineEvent::BatchCompleted {
            batch,
            processed: stats.processed - before.0,
            errors: stats.errors - before.1,
            skipped: stats.skipped - before.2,
        })
        .await;
    }

    async fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}

/// Take one item from acquisition to submission. Returns the stored id.
async fn process_item(
    shared: &Arc<Shared>,
    item: &WorkItem,
    identifier: &str,
    events: Option<&EventSender>,
) -> Result<String, IngestError> {
    let location = item
        .pdf_location
        .as_ref()
        .ok_or(IngestError::MissingLocation)?;
    let id = item.document_id().ok_or(IngestError::MissingLocation)?;

    let path = match location {
        PdfLocation::Remote(url) => {
            let cache = item
                .cache_path(&shared.pdf_dir)
                .ok_or(IngestError::MissingLocation)?;
            if let Acquisition::Downloaded { bytes } = shared.downloader.acquire(url, &cache).await?
            {
                if let Some(tx) = events {
                    let _ = tx
                        .send(PipelineEvent::Downloaded {
                            identifier: identifier.to_string(),
                            bytes,
                        })
                        .await;
                }
            }
            cache
        }
        PdfLocation::Local(path) => path.clone(),
    };

    let extraction = extract(shared, &path).await?;
    let chars = extraction.text.text.chars().count();
    if chars < shared.min_document_chars {
        return Err(IngestError::ExtractionFailed(format!(
            "text too short ({} chars, minimum {})",
            chars, shared.min_document_chars
        )));
    }

    let document = assemble::enrich(id.clone(), item, &path, extraction);
    shared.store.put(&id, &document).await?;
    tracing::debug!(item = %identifier, id = %id, "Submitted document");
    Ok(id)
}

/// Text, metadata and entities for the PDF at `path`, computed on the
/// blocking pool under the extraction ceiling.
async fn extract(shared: &Arc<Shared>, path: &Path) -> Result<Extraction, IngestError> {
    let worker = Arc::clone(shared);
    let path = path.to_path_buf();
    let task = tokio::task::spawn_blocking(move || -> Result<Extraction, PdfError> {
        let (text, metadata) = worker.extractor.analyze(&path)?;
        let entities = worker.engine.extract_all(&text.text);
        Ok(Extraction {
            text,
            metadata,
            entities,
        })
    });

    match tokio::time::timeout(shared.extraction_timeout, task).await {
        Ok(Ok(result)) => Ok(result?),
        Ok(Err(e)) => Err(IngestError::Worker(format!("extraction task failed: {}", e))),
        Err(_) => Err(PdfError::Timeout(shared.extraction_timeout.as_secs()).into()),
    }
}
