//! Document records: PDF metadata and the enriched output record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ExtractedEntities;
use crate::extraction::ExtractionSummary;
use crate::pdf::ExtractionMethod;

/// Metadata read from a PDF file. Missing fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub file_size_bytes: u64,
    pub page_count: u32,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
    pub creation_date: Option<DateTime<Utc>>,
    pub modification_date: Option<DateTime<Utc>>,
}

/// Basic counts over extracted text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStatistics {
    pub char_count: usize,
    pub word_count: usize,
    pub line_count: usize,
    pub paragraph_count: usize,
    pub avg_words_per_line: f64,
    pub avg_chars_per_word: f64,
}

impl TextStatistics {
    pub fn from_text(text: &str) -> Self {
        let words: Vec<&str> = text.split_whitespace().collect();
        let line_count = text.lines().filter(|l| !l.trim().is_empty()).count();
        let paragraph_count = text
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count();
        let word_chars: usize = words.iter().map(|w| w.chars().count()).sum();

        Self {
            char_count: text.chars().count(),
            word_count: words.len(),
            line_count,
            paragraph_count,
            avg_words_per_line: ratio(words.len(), line_count),
            avg_chars_per_word: ratio(word_chars, words.len()),
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// The record submitted to the document store for one ingested PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedDocument {
    /// Store id, derived deterministically from the source id.
    pub id: String,
    pub source_id: Option<String>,
    pub filename: String,
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub region: Option<String>,
    /// Page the source record was scraped from.
    pub source_url: Option<String>,
    /// Where the PDF was obtained.
    pub pdf_location: String,
    pub full_text: String,
    pub extraction_method: ExtractionMethod,
    pub entities: ExtractedEntities,
    pub pdf_metadata: DocumentMetadata,
    pub text_statistics: TextStatistics,
    pub summary: ExtractionSummary,
    pub processed_at: DateTime<Utc>,
}
