//! PDF validation and text extraction.

use std::fs;
use std::path::Path;

use lopdf::Document;
use serde::Serialize;
use tracing::{debug, warn};

use super::{clean_text, metadata, ExtractionMethod, PdfError};
use crate::config::PdfSettings;
use crate::models::DocumentMetadata;

/// Text extracted from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub method: ExtractionMethod,
    pub page_count: u32,
}

/// Cleaned text of a single page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageText {
    /// One-based page number.
    pub number: u32,
    pub text: String,
}

/// A PDF that passed validation, parsed once.
struct LoadedPdf {
    bytes: Vec<u8>,
    document: Document,
    page_count: u32,
}

/// Validates PDFs and extracts their text and metadata.
///
/// All methods are blocking; async callers should run them on the
/// blocking pool.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    max_file_size: u64,
    min_primary_chars: usize,
    min_text_chars: usize,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::from_settings(&PdfSettings::default())
    }
}

impl TextExtractor {
    pub fn from_settings(settings: &PdfSettings) -> Self {
        Self {
            max_file_size: settings.max_file_size,
            min_primary_chars: settings.min_primary_chars,
            min_text_chars: settings.min_text_chars,
        }
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_min_primary_chars(mut self, chars: usize) -> Self {
        self.min_primary_chars = chars;
        self
    }

    pub fn with_min_text_chars(mut self, chars: usize) -> Self {
        self.min_text_chars = chars;
        self
    }

    /// Whether `path` is a readable PDF with at least one page.
    pub fn validate(&self, path: &Path) -> bool {
        match self.check(path) {
            Ok(_) => true,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "PDF failed validation");
                false
            }
        }
    }

    /// Validate `path` and return its page count.
    pub fn check(&self, path: &Path) -> Result<u32, PdfError> {
        self.load(path).map(|pdf| pdf.page_count)
    }

    /// Validate and extract the cleaned text of `path`.
    pub fn extract_text(&self, path: &Path) -> Result<ExtractedText, PdfError> {
        let pdf = self.load(path)?;
        self.text_of(&pdf)
    }

    /// Read metadata from `path`. Never fails; unreadable files give
    /// metadata with only the filename and size filled in.
    pub fn extract_metadata(&self, path: &Path) -> DocumentMetadata {
        let mut meta = DocumentMetadata {
            filename: file_name(path),
            file_size_bytes: fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            ..Default::default()
        };
        match fs::read(path)
            .ok()
            .and_then(|bytes| Document::load_mem(&bytes).ok())
        {
            Some(document) => metadata::apply_info(&document, &mut meta),
            None => debug!(path = %path.display(), "No readable PDF metadata"),
        }
        meta
    }

    /// Cleaned text of every page, in page order. Pages without text are
    /// returned empty.
    pub fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, PdfError> {
        let pdf = self.load(path)?;
        Ok(pdf
            .document
            .get_pages()
            .keys()
            .map(|&number| PageText {
                number,
                text: page_text(&pdf.document, number)
                    .map(|t| clean_text(&t))
                    .unwrap_or_default(),
            })
            .collect())
    }

    /// Load `path` once and return both its text and its metadata.
    pub fn analyze(&self, path: &Path) -> Result<(ExtractedText, DocumentMetadata), PdfError> {
        let pdf = self.load(path)?;
        let text = self.text_of(&pdf)?;
        let mut meta = DocumentMetadata {
            filename: file_name(path),
            file_size_bytes: pdf.bytes.len() as u64,
            ..Default::default()
        };
        metadata::apply_info(&pdf.document, &mut meta);
        Ok((text, meta))
    }

    fn load(&self, path: &Path) -> Result<LoadedPdf, PdfError> {
        if !path.is_file() {
            return Err(PdfError::InvalidDocument(format!(
                "file not found: {}",
                path.display()
            )));
        }
        let size = fs::metadata(path)?.len();
        if size == 0 {
            return Err(PdfError::InvalidDocument("file is empty".into()));
        }
        if size > self.max_file_size {
            return Err(PdfError::InvalidDocument(format!(
                "file is {} bytes, limit is {}",
                size, self.max_file_size
            )));
        }

        let bytes = fs::read(path)?;
        if !infer::archive::is_pdf(&bytes) {
            return Err(PdfError::InvalidDocument("not a PDF file".into()));
        }
        let document = Document::load_mem(&bytes)
            .map_err(|e| PdfError::InvalidDocument(format!("unreadable structure: {}", e)))?;
        let page_count = document.get_pages().len() as u32;
        if page_count == 0 {
            return Err(PdfError::InvalidDocument("document has no pages".into()));
        }

        Ok(LoadedPdf {
            bytes,
            document,
            page_count,
        })
    }

    fn text_of(&self, pdf: &LoadedPdf) -> Result<ExtractedText, PdfError> {
        let mut raw = per_page_text(&pdf.document);
        let mut method = ExtractionMethod::PerPage;

        let primary_len = raw.trim().chars().count();
        if primary_len < self.min_primary_chars {
            debug!(
                chars = primary_len,
                "Per-page text too short, trying whole-document extraction"
            );
            if let Some(fallback) = whole_document_text(&pdf.bytes) {
                if fallback.trim().chars().count() > primary_len {
                    raw = fallback;
                    method = ExtractionMethod::WholeDocument;
                }
            }
        }

        let text = clean_text(&raw);
        let chars = text.chars().count();
        if chars < self.min_text_chars {
            return Err(PdfError::ExtractionFailed(format!(
                "only {} characters of text, need {}",
                chars, self.min_text_chars
            )));
        }

        Ok(ExtractedText {
            text,
            method,
            page_count: pdf.page_count,
        })
    }
}

fn page_text(document: &Document, number: u32) -> Option<String> {
    match document.extract_text(&[number]) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(page = number, error = %e, "Failed to extract page text");
            None
        }
    }
}

/// Non-empty page texts joined by a blank line.
fn per_page_text(document: &Document) -> String {
    document
        .get_pages()
        .keys()
        .filter_map(|&number| page_text(document, number))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// pdf-extract over the whole file. It panics on some malformed inputs,
/// so a panic counts as no text.
fn whole_document_text(bytes: &[u8]) -> Option<String> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Some(text),
        Ok(Err(e)) => {
            warn!(error = %e, "Whole-document extraction failed");
            None
        }
        Err(_) => {
            warn!("Whole-document extraction panicked");
            None
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixture::PdfFixture;
    use tempfile::TempDir;

    const PAGE_ONE: &str = "Carta de doacao de 1532, seculo XVI, primeira metade, da capitania de Sao Vicente.";
    const PAGE_TWO: &str = "Martim Afonso de Sousa recebeu sesmarias e terras para o engenho de acucar.";
    const PAGE_THREE: &str = "Em 1534 Duarte Coelho chegou a Olinda com a armada e fundou a igreja.";

    fn three_pages(dir: &TempDir) -> std::path::PathBuf {
        PdfFixture::new()
            .page(PAGE_ONE)
            .page(PAGE_TWO)
            .page(PAGE_THREE)
            .title("Carta de doacao 1532")
            .author("Chancelaria Regia")
            .creation_date("D:19980115103000Z")
            .write(dir.path(), "carta.pdf")
    }

    #[test]
    fn test_validate_three_page_file() {
        let dir = TempDir::new().unwrap();
        let path = three_pages(&dir);
        let extractor = TextExtractor::default();
        assert!(extractor.validate(&path));
        assert_eq!(extractor.check(&path).unwrap(), 3);
    }

    #[test]
    fn test_validate_rejects_missing_empty_and_oversized() {
        let dir = TempDir::new().unwrap();
        let extractor = TextExtractor::default();
        assert!(!extractor.validate(&dir.path().join("missing.pdf")));

        let empty = dir.path().join("empty.pdf");
        fs::write(&empty, b"").unwrap();
        assert!(!extractor.validate(&empty));

        let path = three_pages(&dir);
        assert!(!extractor.clone().with_max_file_size(16).validate(&path));
    }

    #[test]
    fn test_validate_rejects_non_pdf_and_zero_pages() {
        let dir = TempDir::new().unwrap();
        let extractor = TextExtractor::default();

        let text = dir.path().join("notes.pdf");
        fs::write(&text, b"just some text, not a pdf").unwrap();
        assert!(matches!(
            extractor.check(&text),
            Err(PdfError::InvalidDocument(_))
        ));

        let blank = PdfFixture::new().write(dir.path(), "blank.pdf");
        assert!(!extractor.validate(&blank));
    }

    #[test]
    fn test_extract_text_joins_pages() {
        let dir = TempDir::new().unwrap();
        let path = three_pages(&dir);
        let extracted = TextExtractor::default().extract_text(&path).unwrap();

        assert_eq!(extracted.method, ExtractionMethod::PerPage);
        assert_eq!(extracted.page_count, 3);
        assert!(extracted.text.contains("1532"));
        assert!(extracted.text.contains("Duarte Coelho"));
        assert!(extracted.text.contains("\n\n"));
    }

    #[test]
    fn test_extract_text_too_short_fails() {
        let dir = TempDir::new().unwrap();
        let path = PdfFixture::new().page("Olinda").write(dir.path(), "short.pdf");
        let result = TextExtractor::default().extract_text(&path);
        assert!(matches!(result, Err(PdfError::ExtractionFailed(_))));
    }

    #[test]
    fn test_extract_metadata_reads_info() {
        let dir = TempDir::new().unwrap();
        let path = three_pages(&dir);
        let meta = TextExtractor::default().extract_metadata(&path);

        assert_eq!(meta.filename, "carta.pdf");
        assert_eq!(meta.page_count, 3);
        assert_eq!(meta.title, "Carta de doacao 1532");
        assert_eq!(meta.author, "Chancelaria Regia");
        assert!(meta.file_size_bytes > 0);
        assert_eq!(
            meta.creation_date.map(|d| d.to_rfc3339()),
            Some("1998-01-15T10:30:00+00:00".to_string())
        );
    }

    #[test]
    fn test_extract_metadata_never_fails() {
        let dir = TempDir::new().unwrap();
        let extractor = TextExtractor::default();

        let missing = extractor.extract_metadata(&dir.path().join("gone.pdf"));
        assert_eq!(missing.filename, "gone.pdf");
        assert_eq!(missing.page_count, 0);

        let junk = dir.path().join("junk.pdf");
        fs::write(&junk, b"%PDF-1.4 garbage").unwrap();
        let meta = extractor.extract_metadata(&junk);
        assert_eq!(meta.file_size_bytes, 16);
        assert!(meta.title.is_empty());

        let bare = PdfFixture::new().page(PAGE_ONE).write(dir.path(), "bare.pdf");
        let meta = extractor.extract_metadata(&bare);
        assert_eq!(meta.page_count, 1);
        assert!(meta.author.is_empty());
        assert_eq!(meta.creation_date, None);
    }

    #[test]
    fn test_extract_pages() {
        let dir = TempDir::new().unwrap();
        let path = three_pages(&dir);
        let pages = TextExtractor::default().extract_pages(&path).unwrap();
        let numbers: Vec<u32> = pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(pages[1].text.contains("Martim Afonso"));
    }

    #[test]
    fn test_analyze_returns_text_and_metadata() {
        let dir = TempDir::new().unwrap();
        let path = three_pages(&dir);
        let (text, meta) = TextExtractor::default().analyze(&path).unwrap();
        assert_eq!(text.page_count, meta.page_count);
        assert_eq!(meta.title, "Carta de doacao 1532");
    }
}
