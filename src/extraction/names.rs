//! Person name extraction.

use std::collections::HashSet;

use super::context::SourceText;
use super::normalize::fold;
use super::similarity::best_match;
use crate::models::NameEntity;
use crate::reference::{NameDictionary, NameList};

/// Confidence that `word` belongs to `list`: 1.0 for an exact (folded)
/// match, `similarity / 100` for the best fuzzy match above `threshold`,
/// otherwise 0.
pub fn dictionary_confidence(list: &NameList, word: &str, threshold: f64) -> f64 {
    let folded = fold(word.trim());
    if folded.is_empty() {
        return 0.0;
    }
    if list.contains(&folded) {
        return 1.0;
    }
    best_match(&folded, list.iter(), threshold)
        .map(|(_, score)| (score / 100.0).clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

/// Last-name confidence: the best of the whole surname and each of its
/// words, prepositions excluded.
fn last_name_confidence(names: &NameDictionary, last_name: &str, threshold: f64) -> f64 {
    let whole = dictionary_confidence(names.last_names(), last_name, threshold);
    last_name
        .split_whitespace()
        .filter(|word| !names.is_preposition(word))
        .map(|word| dictionary_confidence(names.last_names(), word, threshold))
        .fold(whole, f64::max)
}

pub fn extract_names(
    source: &SourceText<'_>,
    names: &NameDictionary,
    window: usize,
    fuzzy_threshold: f64,
    min_confidence: f64,
) -> Vec<NameEntity> {
    let text = source.as_str();
    let pattern = names.pattern();
    let mut found = Vec::new();
    let mut at = 0;

    while at < text.len() {
        let Some(caps) = pattern.captures_at(text, at) else {
            break;
        };
        let (Some(whole), Some(first), Some(last)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            break;
        };

        let first_confidence =
            dictionary_confidence(names.first_names(), first.as_str(), fuzzy_threshold);
        let last_confidence = last_name_confidence(names, last.as_str(), fuzzy_threshold);
        let confidence = (first_confidence + last_confidence) / 2.0;

        if confidence > min_confidence {
            let start = source.char_offset(whole.start());
            let end = source.char_offset(whole.end());
            found.push(NameEntity {
                first_name: first.as_str().to_string(),
                last_name: last.as_str().to_string(),
                full_name: whole.as_str().to_string(),
                position: start,
                confidence,
                context: source.context(start, end, window),
            });
            at = whole.end();
        } else {
            // A rejected leading word ("Em Duarte Coelho") may hide a real
            // name starting at the next word.
            at = first.end();
        }
    }

    dedup_names(found)
}

/// Keep the first name per folded `full_name`, then sort by confidence
/// descending.
pub fn dedup_names(names: Vec<NameEntity>) -> Vec<NameEntity> {
    let mut seen = HashSet::new();
    let mut unique: Vec<NameEntity> = names
        .into_iter()
        .filter(|n| seen.insert(fold(&n.full_name)))
        .collect();
    unique.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceData;

    fn extract(text: &str) -> Vec<NameEntity> {
        let data = ReferenceData::bundled();
        extract_names(&SourceText::new(text), &data.names, 100, 80.0, 0.6)
    }

    #[test]
    fn test_exact_dictionary_names() {
        let names = extract("A capitania foi doada a Duarte Coelho pelo rei.");
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].first_name, "Duarte");
        assert_eq!(names[0].last_name, "Coelho");
        assert_eq!(names[0].confidence, 1.0);
        assert_eq!(names[0].position, 24);
    }

    #[test]
    fn test_preposition_and_accents() {
        let names = extract("Carta de Martim Afonso de Sousa e de João Gonçalves.");
        let full: Vec<&str> = names.iter().map(|n| n.full_name.as_str()).collect();
        assert!(full.contains(&"Martim Afonso de Sousa"));
        assert!(full.contains(&"João Gonçalves"));
        assert!(names.iter().all(|n| n.confidence == 1.0));
    }

    #[test]
    fn test_fuzzy_surname_match() {
        let names = extract("O escrivão Pedro Pereyra assinou.");
        assert_eq!(names.len(), 1);
        let expected = (1.0 + 600.0 / 7.0 / 100.0) / 2.0;
        assert!((names[0].confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_words_rejected() {
        assert!(extract("Santa Casa de Misericórdia").is_empty());
        assert!(extract("Nova Lusitânia").is_empty());
    }

    #[test]
    fn test_rejected_prefix_does_not_hide_name() {
        let names = extract("Em Duarte Coelho confiava o rei.");
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].full_name, "Duarte Coelho");
    }

    #[test]
    fn test_dedup_by_folded_full_name() {
        let names = extract("Duarte Coelho escreveu. Depois DUARTE COELHO não. Duarte Coelho voltou.");
        assert_eq!(names.len(), 1);
        let again = dedup_names(names.clone());
        assert_eq!(again, names);
    }

    #[test]
    fn test_confidences_within_bounds() {
        let names = extract("Pedro Álvares Cabral, Tomé de Sousa, Mem de Sá, Jorge Figueiredo Correia");
        assert!(!names.is_empty());
        for name in &names {
            assert!((0.0..=1.0).contains(&name.confidence), "{:?}", name);
        }
        assert!(names.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }
}
