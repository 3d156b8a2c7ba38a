//! Units of ingestion work.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::document_id;

/// Where a work item's PDF lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum PdfLocation {
    Remote(Url),
    Local(PathBuf),
}

impl PdfLocation {
    /// Parse a manifest value: http(s) URLs are remote, `file://` URLs and
    /// anything else are local paths.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if value.starts_with("http://") || value.starts_with("https://") {
            return Url::parse(value).ok().map(PdfLocation::Remote);
        }
        if value.starts_with("file://") {
            return Url::parse(value)
                .ok()
                .and_then(|u| u.to_file_path().ok())
                .map(PdfLocation::Local);
        }
        Some(PdfLocation::Local(PathBuf::from(value)))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, PdfLocation::Remote(_))
    }

    /// File stem of the referenced PDF, if it has one.
    pub fn file_stem(&self) -> Option<String> {
        match self {
            PdfLocation::Remote(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .map(|s| {
                    let decoded = urlencoding::decode(s)
                        .map(|d| d.into_owned())
                        .unwrap_or_else(|_| s.to_string());
                    let stem = Path::new(&decoded)
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned());
                    stem.unwrap_or(decoded)
                }),
            PdfLocation::Local(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned()),
        }
    }
}

impl std::fmt::Display for PdfLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfLocation::Remote(url) => write!(f, "{}", url),
            PdfLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One source document reference to ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub source_id: Option<String>,
    /// `None` when the manifest record carried no usable PDF reference.
    pub pdf_location: Option<PdfLocation>,
    pub source_title: Option<String>,
    pub source_author: Option<String>,
    pub source_year: Option<i32>,
    /// Page the record was scraped from.
    pub source_url: Option<String>,
}

impl WorkItem {
    pub fn new(source_id: impl Into<String>, pdf_location: PdfLocation) -> Self {
        Self {
            source_id: Some(source_id.into()),
            pdf_location: Some(pdf_location),
            source_title: None,
            source_author: None,
            source_year: None,
            source_url: None,
        }
    }

    /// Work item for a PDF found on disk; the file stem is the source id.
    pub fn from_local_file(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Self::new(stem, PdfLocation::Local(path.to_path_buf()))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.source_title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.source_author = Some(author.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.source_year = Some(year);
        self
    }

    /// Label used in logs and failure records.
    pub fn identifier(&self) -> String {
        if let Some(id) = self.source_id.as_deref().filter(|s| !s.trim().is_empty()) {
            return id.to_string();
        }
        if let Some(title) = self.source_title.as_deref().filter(|s| !s.trim().is_empty()) {
            return title.to_string();
        }
        match &self.pdf_location {
            Some(location) => location.to_string(),
            None => "<unnamed item>".to_string(),
        }
    }

    /// Deterministic store id: the source id, else the PDF file stem.
    pub fn document_id(&self) -> Option<String> {
        self.source_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(document_id)
            .or_else(|| {
                self.pdf_location
                    .as_ref()
                    .and_then(PdfLocation::file_stem)
                    .map(|stem| document_id(&stem))
            })
    }

    /// Deterministic cache path for a remote PDF.
    pub fn cache_path(&self, pdf_dir: &Path) -> Option<PathBuf> {
        self.document_id()
            .map(|id| pdf_dir.join(format!("{}.pdf", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location_kinds() {
        assert!(matches!(
            PdfLocation::parse("https://arquivo.example.org/doc/carta.pdf"),
            Some(PdfLocation::Remote(_))
        ));
        assert_eq!(
            PdfLocation::parse("pdfs/carta.pdf"),
            Some(PdfLocation::Local(PathBuf::from("pdfs/carta.pdf")))
        );
        assert_eq!(
            PdfLocation::parse("file:///tmp/carta.pdf"),
            Some(PdfLocation::Local(PathBuf::from("/tmp/carta.pdf")))
        );
        assert_eq!(PdfLocation::parse("   "), None);
    }

    #[test]
    fn test_location_serializes_tagged() {
        let remote = PdfLocation::parse("https://example.org/carta.pdf").unwrap();
        let json = serde_json::to_value(&remote).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "remote", "location": "https://example.org/carta.pdf"})
        );
        let back: PdfLocation = serde_json::from_value(json).unwrap();
        assert_eq!(back, remote);
    }

    #[test]
    fn test_remote_file_stem_is_decoded() {
        let location = PdfLocation::parse("https://example.org/files/Carta%20Regia.pdf?x=1").unwrap();
        assert_eq!(location.file_stem().as_deref(), Some("Carta Regia"));
    }

    #[test]
    fn test_document_id_prefers_source_id() {
        let item = WorkItem::new(
            "64f1 a2",
            PdfLocation::parse("https://example.org/other.pdf").unwrap(),
        );
        assert_eq!(item.document_id().as_deref(), Some("64f1_a2"));

        let anonymous = WorkItem {
            source_id: None,
            ..item
        };
        assert_eq!(anonymous.document_id().as_deref(), Some("other"));
    }

    #[test]
    fn test_cache_path_is_deterministic() {
        let item = WorkItem::new("abc123", PdfLocation::parse("https://example.org/x.pdf").unwrap());
        let dir = Path::new("/cache");
        assert_eq!(item.cache_path(dir), Some(PathBuf::from("/cache/abc123.pdf")));
        assert_eq!(item.cache_path(dir), item.cache_path(dir));
    }

    #[test]
    fn test_similar_source_ids_get_separate_cache_paths() {
        let location = PdfLocation::parse("https://example.org/x.pdf").unwrap();
        let dir = Path::new("/cache");
        let a = WorkItem::new("doc/1", location.clone());
        let b = WorkItem::new("doc:1", location.clone());
        let c = WorkItem::new("doc_1", location);

        let paths = [a.cache_path(dir), b.cache_path(dir), c.cache_path(dir)];
        assert_ne!(paths[0], paths[1]);
        assert_ne!(paths[0], paths[2]);
        assert_ne!(paths[1], paths[2]);
        assert_eq!(paths[2], Some(PathBuf::from("/cache/doc_1.pdf")));
        assert_eq!(a.cache_path(dir).unwrap().parent(), Some(dir));
    }

    #[test]
    fn test_identifier_falls_back_to_title() {
        let item = WorkItem {
            source_id: None,
            pdf_location: None,
            source_title: Some("Carta de doação".to_string()),
            source_author: None,
            source_year: None,
            source_url: None,
        };
        assert_eq!(item.identifier(), "Carta de doação");
        assert_eq!(item.document_id(), None);
    }
}
