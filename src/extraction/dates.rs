//! Date extraction: explicit years and century phrases.

use std::collections::HashSet;

use super::context::SourceText;
use crate::models::{DateEntity, DateKind};
use crate::reference::DatePatterns;

/// Confidence of an explicit four-digit year.
pub const EXPLICIT_CONFIDENCE: f64 = 0.9;
/// Confidence of a century phrase.
pub const TEXTUAL_CONFIDENCE: f64 = 0.7;

/// Century label for a year.
///
/// 1500-1899 use Roman numerals; any other year gets `floor(year / 100) + 1`
/// as a plain number.
pub fn century_label(year: i32) -> String {
    match year {
        1500..=1599 => "XVI".to_string(),
        1600..=1699 => "XVII".to_string(),
        1700..=1799 => "XVIII".to_string(),
        1800..=1899 => "XIX".to_string(),
        _ => (year.div_euclid(100) + 1).to_string(),
    }
}

/// Year range for a century phrase. Without a qualifier the whole century.
pub fn century_range(base_year: i32, part: Option<(u32, u32)>) -> (i32, i32) {
    match part {
        Some((start_pct, end_pct)) => (
            base_year + (start_pct * 99 / 100) as i32,
            base_year + (end_pct * 99 / 100) as i32,
        ),
        None => (base_year, base_year + 99),
    }
}

pub fn extract_dates(
    source: &SourceText<'_>,
    patterns: &DatePatterns,
    window: usize,
    bucket_size: usize,
) -> Vec<DateEntity> {
    let text = source.as_str();
    let mut dates = Vec::new();

    for caps in patterns.year.captures_iter(text) {
        let Some(year_match) = caps.name("year") else {
            continue;
        };
        let Ok(year) = year_match.as_str().parse::<i32>() else {
            continue;
        };
        let start = source.char_offset(year_match.start());
        let end = source.char_offset(year_match.end());
        dates.push(DateEntity {
            kind: DateKind::Explicit,
            year,
            year_end: None,
            century: century_label(year),
            period_label: None,
            source_span: year_match.as_str().to_string(),
            position: start,
            confidence: EXPLICIT_CONFIDENCE,
            context: source.context(start, end, window),
        });
    }

    for caps in patterns.textual_phrase.captures_iter(text) {
        let (Some(whole), Some(century)) = (caps.get(0), caps.name("century")) else {
            continue;
        };
        let Some(base_year) = patterns.century_base(century.as_str()) else {
            tracing::debug!(century = century.as_str(), "Unmapped century phrase");
            continue;
        };

        let part = caps.name("part").map(|m| m.as_str());
        let range = part.and_then(|p| patterns.part_range(p));
        let (year, year_end) = century_range(base_year, range);

        let start = source.char_offset(whole.start());
        let end = source.char_offset(whole.end());
        dates.push(DateEntity {
            kind: DateKind::Textual,
            year,
            year_end: Some(year_end),
            century: century_label(year),
            period_label: part.filter(|_| range.is_some()).map(str::to_string),
            source_span: whole.as_str().to_string(),
            position: start,
            confidence: TEXTUAL_CONFIDENCE,
            context: source.context(start, end, window),
        });
    }

    dedup_dates(dates, bucket_size)
}

/// Keep the first date per `(year, position / bucket_size)`, then sort by
/// position.
pub fn dedup_dates(dates: Vec<DateEntity>, bucket_size: usize) -> Vec<DateEntity> {
    let bucket_size = bucket_size.max(1);
    let mut seen = HashSet::new();
    let mut unique: Vec<DateEntity> = dates
        .into_iter()
        .filter(|d| seen.insert((d.year, d.position / bucket_size)))
        .collect();
    unique.sort_by_key(|d| d.position);
    unique
}
