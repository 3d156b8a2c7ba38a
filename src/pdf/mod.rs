//! PDF validation, text extraction and metadata.
//!
//! Text comes from one of two strategies: lopdf's per-page content-stream
//! text (primary), or pdf-extract over the whole document when the primary
//! strategy yields too little. Either way the result is cleaned with
//! [`clean_text`] before it is returned.

mod clean;
mod extractor;
#[cfg(test)]
pub(crate) mod fixture;
mod metadata;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use clean::clean_text;
pub use extractor::{ExtractedText, PageText, TextExtractor};
pub use metadata::{decode_pdf_string, parse_pdf_date};

/// Errors that can occur while reading a PDF.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The file failed structural validation.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Text could not be extracted or was too short.
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Extraction timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which strategy produced a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// lopdf text, page by page.
    PerPage,
    /// pdf-extract over the whole document.
    WholeDocument,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerPage => "per_page",
            Self::WholeDocument => "whole_document",
        }
    }
}
