//! Theme classification by keyword occurrence.
//!
//! A category's relevance is a weighted sum of four components, clamped to
//! `[0, 1]` as a whole:
//!
//! | component | weight | value |
//! |---|---|---|
//! | coverage | 0.3 | distinct matched keywords, saturating at 3 |
//! | frequency | 0.3 | occurrences, saturating at 10 |
//! | density | 0.2 | occurrences per word, x100, uncapped |
//! | distribution | 0.2 | `min(4 * variance, 1)` of positions normalized by text length |


use super::context::SourceText;
use super::normalize::FoldedText;
use crate::models::ThemeEntity;
use crate::reference::{ThemeCategory, ThemeTaxonomy};

const COVERAGE_WEIGHT: f64 = 0.3;
const FREQUENCY_WEIGHT: f64 = 0.3;
const DENSITY_WEIGHT: f64 = 0.2;
const DISTRIBUTION_WEIGHT: f64 = 0.2;

/// Distinct keywords at which coverage saturates.
const COVERAGE_SATURATION: f64 = 3.0;
/// Occurrences at which frequency saturates.
const FREQUENCY_SATURATION: f64 = 10.0;
/// Distribution score when there are too few occurrences to measure spread.
const SINGLE_OCCURRENCE_DISTRIBUTION: f64 = 0.5;

/// Spread of occurrence positions, each already normalized to `[0, 1]`.
/// Spread-out mentions score higher than clustered ones.
pub fn distribution_score(normalized_positions: &[f64]) -> f64 {
    if normalized_positions.len() <= 1 {
        return SINGLE_OCCURRENCE_DISTRIBUTION;
    }
    let n = normalized_positions.len() as f64;
    let mean = normalized_positions.iter().sum::<f64>() / n;
    let variance = normalized_positions
        .iter()
        .map(|p| (p - mean).powi(2))
        .sum::<f64>()
        / n;
    (4.0 * variance).min(1.0)
}

/// Combined relevance score, clamped to `[0, 1]`.
pub fn relevance_score(
    unique_keywords: usize,
    occurrences: usize,
    word_count: usize,
    distribution: f64,
) -> f64 {
    let coverage = (unique_keywords as f64 / COVERAGE_SATURATION).min(1.0);
    let frequency = (occurrences as f64 / FREQUENCY_SATURATION).min(1.0);
    let density = if word_count == 0 {
        0.0
    } else {
        occurrences as f64 / word_count as f64 * 100.0
    };

    (COVERAGE_WEIGHT * coverage
        + FREQUENCY_WEIGHT * frequency
        + DENSITY_WEIGHT * density
        + DISTRIBUTION_WEIGHT * distribution.clamp(0.0, 1.0))
    .clamp(0.0, 1.0)
}

/// Settings for theme extraction.
#[derive(Debug, Clone, Copy)]
pub struct ThemeOptions {
    pub window: usize,
    pub max_contexts: usize,
    pub min_score: f64,
}

pub fn extract_themes(
    source: &SourceText<'_>,
    taxonomy: &ThemeTaxonomy,
    options: ThemeOptions,
) -> Vec<ThemeEntity> {
    let lowered = FoldedText::new(source.as_str(), false);
    let lowered_source = SourceText::new(lowered.as_str());
    let word_count = source.as_str().split_whitespace().count();
    let text_len = source.char_len().max(1) as f64;

    let mut themes: Vec<ThemeEntity> = taxonomy
        .categories()
        .iter()
        .filter_map(|category| {
            score_category(category, &lowered, &lowered_source, source, word_count, text_len, options)
        })
        .collect();

    themes.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    themes
}

fn score_category(
    category: &ThemeCategory,
    lowered: &FoldedText,
    lowered_source: &SourceText<'_>,
    source: &SourceText<'_>,
    word_count: usize,
    text_len: f64,
    options: ThemeOptions,
) -> Option<ThemeEntity> {
    let haystack = lowered.as_str();
    let mut matched_keywords = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();

    for (keyword, needle) in category.keywords.iter().zip(&category.lowered) {
        let needle_chars = needle.chars().count();
        let before = spans.len();
        let mut from = 0;

        while let Some(found) = haystack[from..].find(needle.as_str()) {
            let byte = from + found;
            let start = lowered_source.char_offset(byte);
            spans.push(lowered.origin_span(start, start + needle_chars));
            from = byte + haystack[byte..].chars().next().map_or(1, char::len_utf8);
        }

        if spans.len() > before {
            matched_keywords.push(keyword.clone());
        }
    }

    if matched_keywords.is_empty() {
        return None;
    }

    spans.sort_unstable();
    let positions: Vec<f64> = spans.iter().map(|(start, _)| *start as f64 / text_len).collect();
    let score = relevance_score(
        matched_keywords.len(),
        spans.len(),
        word_count,
        distribution_score(&positions),
    );

    if score <= options.min_score {
        tracing::debug!(category = %category.name, score, "Theme below threshold");
        return None;
    }

    let sample_contexts = spans
        .iter()
        .take(options.max_contexts)
        .map(|(start, end)| source.context(*start, *end, options.window))
        .collect();

    Some(ThemeEntity {
        category: category.name.clone(),
        matched_keywords,
        occurrence_count: spans.len(),
        relevance_score: score,
        sample_contexts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceData;

    const OPTIONS: ThemeOptions = ThemeOptions {
        window: 50,
        max_contexts: 3,
        min_score: 0.1,
    };

    fn filler(words: usize) -> String {
        vec!["lorem"; words].join(" ")
    }

    #[test]
    fn test_clustered_mentions_score_lower_distribution() {
        // 8 mentions in 8000 words: once every 1000 words, or all in the first paragraph
        let spread: String = (0..8)
            .map(|_| format!("engenho {}", filler(999)))
            .collect::<Vec<_>>()
            .join("\n\n");
        let clustered = format!("{}\n\n{}", vec!["engenho"; 8].join(" "), filler(7992));

        let taxonomy = ThemeTaxonomy::from_json(r#"{"economia": ["engenho"]}"#).unwrap();
        let spread_theme = &extract_themes(&SourceText::new(&spread), &taxonomy, OPTIONS)[0];
        let clustered_theme = &extract_themes(&SourceText::new(&clustered), &taxonomy, OPTIONS)[0];

        assert_eq!(spread_theme.occurrence_count, 8);
        assert_eq!(clustered_theme.occurrence_count, 8);
        assert!(clustered_theme.relevance_score < spread_theme.relevance_score);

        let spread_positions: Vec<f64> = (0..8).map(|i| i as f64 / 8.0).collect();
        let clustered_positions: Vec<f64> = (0..8).map(|i| i as f64 / 100.0).collect();
        assert!(distribution_score(&clustered_positions) < distribution_score(&spread_positions));
    }

    #[test]
    fn test_distribution_edge_cases() {
        assert_eq!(distribution_score(&[]), 0.5);
        assert_eq!(distribution_score(&[0.3]), 0.5);
        assert_eq!(distribution_score(&[0.0, 1.0]), 1.0);
        assert_eq!(distribution_score(&[0.5, 0.5, 0.5]), 0.0);
    }

    #[test]
    fn test_relevance_components_are_capped() {
        assert!((relevance_score(10, 100, 10, 1.0) - 1.0).abs() < 1e-9);
        let single = relevance_score(1, 1, 1000, 0.5);
        let expected = 0.3 / 3.0 + 0.3 * 0.1 + 0.2 * 0.1 + 0.2 * 0.5;
        assert!((single - expected).abs() < 1e-9);
    }

    #[test]
    fn test_dense_short_text_saturates_total() {
        // density term alone is 0.2 * 20
        assert!((relevance_score(1, 2, 10, 0.5) - 1.0).abs() < 1e-9);

        let sparse = relevance_score(1, 2, 1000, 0.5);
        let expected = 0.3 / 3.0 + 0.3 * 0.2 + 0.2 * 0.2 + 0.2 * 0.5;
        assert!((sparse - expected).abs() < 1e-9);
    }

    #[test]
    fn test_case_insensitive_matching_and_contexts() {
        let data = ReferenceData::bundled();
        let text = "A IGREJA de Olinda. O padre celebrou na Igreja matriz. Outro padre, outra igreja.";
        let themes = extract_themes(&SourceText::new(text), &data.themes, OPTIONS);
        let religiao = themes.iter().find(|t| t.category == "religiao").unwrap();

        assert_eq!(religiao.occurrence_count, 5);
        assert_eq!(religiao.matched_keywords, vec!["igreja", "padre"]);
        assert_eq!(religiao.sample_contexts.len(), 3);
        assert!(religiao.sample_contexts[0].contains("IGREJA"));
    }

    #[test]
    fn test_min_score_filters_categories() {
        let taxonomy = ThemeTaxonomy::from_json(r#"{"militar": ["forte"]}"#).unwrap();
        let text = format!("o forte {}", filler(500));
        let strict = ThemeOptions {
            min_score: 0.5,
            ..OPTIONS
        };
        assert_eq!(extract_themes(&SourceText::new(&text), &taxonomy, OPTIONS).len(), 1);
        assert!(extract_themes(&SourceText::new(&text), &taxonomy, strict).is_empty());
    }

    #[test]
    fn test_scores_bounded_and_sorted() {
        let data = ReferenceData::bundled();
        let text = "Sesmaria de terras com engenho de açúcar, doação da capitania ao donatário. \
                    O governador mandou erguer um forte. Comércio de açúcar e dízimo à igreja.";
        let themes = extract_themes(&SourceText::new(text), &data.themes, OPTIONS);
        assert!(themes.len() >= 3);
        assert!(themes.iter().all(|t| (0.0..=1.0).contains(&t.relevance_score)));
        assert!(themes.windows(2).all(|w| w[0].relevance_score >= w[1].relevance_score));
    }
}
