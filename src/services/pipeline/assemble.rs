//! Building the stored record from a work item and its extraction results.

use std::path::Path;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use crate::extraction::ExtractionSummary;
use crate::models::{DocumentMetadata, EnrichedDocument, ExtractedEntities, TextStatistics, WorkItem};
use crate::pdf::ExtractedText;

/// Author used when neither the source nor the PDF names one.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// A four-digit year from 1000 to 2099 not embedded in a longer number.
static YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(1\d{3}|20\d{2})(?:\D|$)").expect("year pattern is valid")
});

/// Everything the pipeline learned about one PDF.
pub struct Extraction {
    pub text: ExtractedText,
    pub metadata: DocumentMetadata,
    pub entities: ExtractedEntities,
}

/// First plausible year in `text`.
pub fn year_in(text: &str) -> Option<i32> {
    YEAR_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Assemble the record stored under `id`. Source metadata wins over PDF
/// metadata, which wins over values derived from the file name.
pub fn enrich(id: String, item: &WorkItem, pdf_path: &Path, extraction: Extraction) -> EnrichedDocument {
    let Extraction {
        text,
        metadata,
        entities,
    } = extraction;

    let filename = metadata.filename.clone();
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| id.clone());

    let title = present(item.source_title.as_deref())
        .or_else(|| present(Some(&metadata.title)))
        .unwrap_or_else(|| stem.clone());
    let author = present(item.source_author.as_deref())
        .or_else(|| present(Some(&metadata.author)))
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    let year = item
        .source_year
        .or_else(|| year_in(&metadata.title))
        .or_else(|| year_in(&filename));
    let region = entities.places.first().map(|p| p.region.clone());
    let pdf_location = item
        .pdf_location
        .as_ref()
        .map(|l| l.to_string())
        .unwrap_or_else(|| pdf_path.display().to_string());

    EnrichedDocument {
        id,
        source_id: item.source_id.clone(),
        filename,
        title,
        author,
        year,
        region,
        source_url: item.source_url.clone(),
        pdf_location,
        text_statistics: TextStatistics::from_text(&text.text),
        summary: ExtractionSummary::from_entities(&entities),
        full_text: text.text,
        extraction_method: text.method,
        entities,
        pdf_metadata: metadata,
        processed_at: Utc::now(),
    }
}
