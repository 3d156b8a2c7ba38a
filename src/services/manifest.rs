//! Work-item sources: a JSON manifest of scraped records, or a directory
//! of PDFs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{PdfLocation, WorkItem};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Manifest {0} is not a JSON array of records")]
    NotAnArray(PathBuf),
}

const ID_KEYS: &[&str] = &["id", "source_id", "_id"];
const PDF_KEYS: &[&str] = &["pdf_url", "pdf_links", "pdf_path"];
const TITLE_KEYS: &[&str] = &["title", "titulo"];
const AUTHOR_KEYS: &[&str] = &["author", "autor"];
const YEAR_KEYS: &[&str] = &["year", "ano_publicacao"];
const URL_KEYS: &[&str] = &["url", "source_url"];

/// Work items for a run: the local PDF directory when `local_only` is set
/// or the manifest is absent, otherwise the manifest records.
pub async fn collect_work_items(
    manifest: &Path,
    pdf_dir: &Path,
    local_only: bool,
) -> Result<Vec<WorkItem>, ManifestError> {
    if local_only {
        return scan_pdf_dir(pdf_dir).await;
    }
    if !tokio::fs::try_exists(manifest).await.unwrap_or(false) {
        tracing::info!(
            manifest = %manifest.display(),
            "No manifest found, scanning local PDFs"
        );
        return scan_pdf_dir(pdf_dir).await;
    }
    load_manifest(manifest).await
}

/// Read a manifest file. Relative PDF paths resolve against the
/// manifest's directory.
pub async fn load_manifest(path: &Path) -> Result<Vec<WorkItem>, ManifestError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let items = parse_manifest(&raw, base).map_err(|e| match e {
        ParseError::Json(source) => ManifestError::Json {
            path: path.to_path_buf(),
            source,
        },
        ParseError::NotAnArray => ManifestError::NotAnArray(path.to_path_buf()),
    })?;
    tracing::info!(path = %path.display(), items = items.len(), "Loaded manifest");
    Ok(items)
}

/// Manifest content errors, before a file path is attached.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array")]
    NotAnArray,
}

/// Parse manifest JSON. Non-object entries are ignored.
pub fn parse_manifest(json: &str, base_dir: &Path) -> Result<Vec<WorkItem>, ParseError> {
    let value: Value = serde_json::from_str(json)?;
    let records = value.as_array().ok_or(ParseError::NotAnArray)?;
    Ok(records
        .iter()
        .filter_map(Value::as_object)
        .map(|record| record_to_item(record, base_dir))
        .collect())
}

/// Every `*.pdf` in `dir`, sorted by file name. A missing directory is
/// an empty listing.
pub async fn scan_pdf_dir(dir: &Path) -> Result<Vec<WorkItem>, ManifestError> {
    let io_err = |source: std::io::Error| ManifestError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(dir = %dir.display(), "PDF directory does not exist");
            return Ok(Vec::new());
        }
        Err(e) => return Err(io_err(e)),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    tracing::info!(dir = %dir.display(), files = paths.len(), "Scanned local PDFs");
    Ok(paths.iter().map(|p| WorkItem::from_local_file(p)).collect())
}

fn record_to_item(record: &Map<String, Value>, base_dir: &Path) -> WorkItem {
    let pdf_location = first(record, PDF_KEYS)
        .and_then(pdf_reference)
        .and_then(|raw| PdfLocation::parse(&raw))
        .map(|location| match location {
            PdfLocation::Local(path) if path.is_relative() => {
                PdfLocation::Local(base_dir.join(path))
            }
            other => other,
        });

    WorkItem {
        source_id: first(record, ID_KEYS).and_then(identifier),
        pdf_location,
        source_title: first(record, TITLE_KEYS).and_then(non_empty_string),
        source_author: first(record, AUTHOR_KEYS).and_then(non_empty_string),
        source_year: first(record, YEAR_KEYS).and_then(year),
        source_url: first(record, URL_KEYS).and_then(non_empty_string),
    }
}

/// First non-null value among `keys`.
fn first<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

fn non_empty_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A string, a number, or a `{"$oid": "..."}` object.
fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => non_empty_string(value),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("$oid").and_then(non_empty_string),
        _ => None,
    }
}

/// A string or the first string of a list.
fn pdf_reference(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(non_empty_string),
        other => non_empty_string(other),
    }
}

/// A number or a string holding one.
fn year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scraped_record_shape() {
        let json = r#"[{
            "_id": {"$oid": "64f1c2a9e4b0"},
            "titulo": "Carta de doação",
            "autor": "D. João III",
            "ano_publicacao": "1534",
            "url": "https://arquivo.example.org/item/1",
            "pdf_links": ["https://arquivo.example.org/files/carta.pdf", "https://mirror/x.pdf"]
        }]"#;
        let items = parse_manifest(json, Path::new("/data")).unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.source_id.as_deref(), Some("64f1c2a9e4b0"));
        assert_eq!(item.source_title.as_deref(), Some("Carta de doação"));
        assert_eq!(item.source_author.as_deref(), Some("D. João III"));
        assert_eq!(item.source_year, Some(1534));
        assert_eq!(
            item.pdf_location.as_ref().map(|l| l.to_string()).as_deref(),
            Some("https://arquivo.example.org/files/carta.pdf")
        );
        assert_eq!(item.source_url.as_deref(), Some("https://arquivo.example.org/item/1"));
    }

    #[test]
    fn test_parse_plain_record_shape() {
        let json = r#"[
            {"id": 17, "title": "Foral", "year": 1550, "pdf_path": "pdfs/foral.pdf"},
            {"source_id": "sem-pdf", "title": "Sem arquivo"},
            "ignored"
        ]"#;
        let items = parse_manifest(json, Path::new("/data")).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source_id.as_deref(), Some("17"));
        assert_eq!(
            items[0].pdf_location,
            Some(PdfLocation::Local(PathBuf::from("/data/pdfs/foral.pdf")))
        );
        assert_eq!(items[0].source_year, Some(1550));
        assert_eq!(items[1].pdf_location, None);
        assert_eq!(items[1].source_year, None);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            parse_manifest(r#"{"items": []}"#, Path::new(".")),
            Err(ParseError::NotAnArray)
        ));
        assert!(matches!(
            parse_manifest("[", Path::new(".")),
            Err(ParseError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_scan_pdf_dir_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let items = scan_pdf_dir(dir.path()).await.unwrap();
        let ids: Vec<_> = items.iter().filter_map(|i| i.source_id.clone()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_missing_manifest_falls_back_to_scan() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("carta.pdf"), b"x").unwrap();
        let items = collect_work_items(&dir.path().join("absent.json"), dir.path(), false)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source_id.as_deref(), Some("carta"));
    }

    #[tokio::test]
    async fn test_local_only_ignores_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("items.json");
        std::fs::write(&manifest, r#"[{"id": "remote", "pdf_url": "https://x/y.pdf"}]"#).unwrap();

        let from_manifest = collect_work_items(&manifest, dir.path(), false).await.unwrap();
        assert_eq!(from_manifest[0].source_id.as_deref(), Some("remote"));

        let local = collect_work_items(&manifest, dir.path(), true).await.unwrap();
        assert!(local.is_empty());
    }
}
