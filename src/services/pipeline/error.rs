//! Per-item ingestion errors and how they are counted.

use thiserror::Error;

use crate::pdf::PdfError;
use crate::services::download::DownloadError;
use crate::store::StoreError;

/// Why a work item did not reach the store.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no PDF location")]
    MissingLocation,

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<PdfError> for IngestError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::InvalidDocument(msg) => Self::InvalidDocument(msg),
            PdfError::Io(e) => Self::InvalidDocument(e.to_string()),
            PdfError::ExtractionFailed(msg) => Self::ExtractionFailed(msg),
            e @ PdfError::Timeout(_) => Self::ExtractionFailed(e.to_string()),
        }
    }
}

/// Terminal state of an item that was not submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Skipped,
    Failed,
}

impl IngestError {
    /// Unusable inputs are skipped; transport and store problems are
    /// failures.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::MissingLocation
            | Self::InvalidDocument(_)
            | Self::ExtractionFailed(_)
            | Self::Download(DownloadError::TooLarge { .. }) => Disposition::Skipped,
            Self::Download(_) | Self::Store(_) | Self::Worker(_) => Disposition::Failed,
        }
    }
}
