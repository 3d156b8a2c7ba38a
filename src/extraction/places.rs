//! Place extraction against the gazetteer.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use super::context::SourceText;
use super::normalize::FoldedText;
use super::similarity::{max_similarity, similarity};
use crate::models::{MatchKind, PlaceEntity};
use crate::reference::Gazetteer;

/// A whitespace-delimited token of the folded text.
struct Token<'t> {
    text: &'t str,
    /// Folded character span.
    start: usize,
    end: usize,
}

/// Distinct tokens in order of first appearance, punctuation trimmed.
fn distinct_tokens(folded: &str) -> Vec<Token<'_>> {
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    let mut token_start: Option<(usize, usize)> = None;

    for (char_index, (byte, c)) in folded.char_indices().enumerate() {
        if c.is_whitespace() {
            if let Some((byte_start, char_start)) = token_start.take() {
                push_token(folded, byte_start..byte, char_start, &mut seen, &mut tokens);
            }
        } else if token_start.is_none() {
            token_start = Some((byte, char_index));
        }
    }
    if let Some((byte_start, char_start)) = token_start {
        push_token(folded, byte_start..folded.len(), char_start, &mut seen, &mut tokens);
    }

    tokens
}

fn push_token<'t>(
    folded: &'t str,
    bytes: std::ops::Range<usize>,
    char_start: usize,
    seen: &mut HashSet<&'t str>,
    tokens: &mut Vec<Token<'t>>,
) {
    let raw = &folded[bytes];
    let front_trimmed = raw.trim_start_matches(|c: char| !c.is_alphanumeric());
    let text = front_trimmed.trim_end_matches(|c: char| !c.is_alphanumeric());
    if text.is_empty() || !seen.insert(text) {
        return;
    }
    let start = char_start + raw[..raw.len() - front_trimmed.len()].chars().count();
    tokens.push(Token {
        text,
        start,
        end: start + text.chars().count(),
    });
}

pub fn extract_places(
    source: &SourceText<'_>,
    gazetteer: &Gazetteer,
    window: usize,
    fuzzy_threshold: f64,
) -> Vec<PlaceEntity> {
    let folded = FoldedText::new(source.as_str(), true);
    let folded_str = folded.as_str();
    let tokens = distinct_tokens(folded_str);
    let mut places = Vec::new();

    for entry in gazetteer.entries() {
        if entry.normalized.is_empty() {
            continue;
        }

        if let Some(byte) = folded_str.find(&entry.normalized) {
            let start = folded_str[..byte].chars().count();
            let end = start + entry.normalized.chars().count();
            let (origin_start, origin_end) = folded.origin_span(start, end);
            places.push(PlaceEntity {
                location: entry.location.clone(),
                region: entry.region.clone(),
                position: origin_start,
                confidence: 1.0,
                match_kind: MatchKind::Exact,
                context: source.context(origin_start, origin_end, window),
            });
            continue;
        }

        let entry_len = entry.normalized.chars().count();
        for token in &tokens {
            if max_similarity(entry_len, token.end - token.start) <= fuzzy_threshold {
                continue;
            }
            let score = similarity(token.text, &entry.normalized);
            if score > fuzzy_threshold {
                let (origin_start, origin_end) = folded.origin_span(token.start, token.end);
                places.push(PlaceEntity {
                    location: entry.location.clone(),
                    region: entry.region.clone(),
                    position: origin_start,
                    confidence: (score / 100.0).clamp(0.0, 1.0),
                    match_kind: MatchKind::Fuzzy,
                    context: source.context(origin_start, origin_end, window),
                });
            }
        }
    }

    dedup_places(places)
}

/// Keep one place per `(location, region)`: the highest confidence, the
/// earliest position among equals. Sorted by confidence descending.
pub fn dedup_places(places: Vec<PlaceEntity>) -> Vec<PlaceEntity> {
    let mut best: HashMap<(String, String), PlaceEntity> = HashMap::new();
    let mut order = Vec::new();

    for place in places {
        let key = (place.location.clone(), place.region.clone());
        match best.entry(key) {
            Entry::Occupied(mut kept) => {
                let kept = kept.get_mut();
                let better = place.confidence > kept.confidence
                    || (place.confidence == kept.confidence && place.position < kept.position);
                if better {
                    *kept = place;
                }
            }
            Entry::Vacant(slot) => {
                order.push(slot.key().clone());
                slot.insert(place);
            }
        }
    }

    let mut unique: Vec<PlaceEntity> = order
        .into_iter()
        .filter_map(|key| best.remove(&key))
        .collect();
    unique.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    unique
}
