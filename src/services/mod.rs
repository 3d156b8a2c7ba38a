//! Service layer for histdoc.
//!
//! This module contains the ingestion logic separated from UI concerns.
//! Services emit events for progress tracking and can be driven by the
//! CLI or used directly as a library.

pub mod download;
pub mod manifest;
pub mod pipeline;

pub use download::{Acquisition, DownloadError, Downloader};
pub use manifest::{collect_work_items, ManifestError};
pub use pipeline::{
    BatchStats, CancelFlag, IngestError, ItemOutcome, Pipeline, PipelineEvent, RunOptions,
    RunSummary,
};
