//! Roll-up of the entities found in one document.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{ExtractedEntities, MatchKind};

/// Names above this confidence count as high-confidence.
pub const HIGH_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateSummary {
    pub count: usize,
    pub years: Vec<i32>,
    pub centuries: Vec<String>,
    pub earliest_year: Option<i32>,
    pub latest_year: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameSummary {
    pub count: usize,
    pub high_confidence: usize,
    pub unique_first_names: Vec<String>,
    pub unique_last_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub count: usize,
    pub regions: Vec<String>,
    pub exact_matches: usize,
    pub fuzzy_matches: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeSummary {
    pub count: usize,
    pub categories: Vec<String>,
    pub top_category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub dates: DateSummary,
    pub names: NameSummary,
    pub places: PlaceSummary,
    pub themes: ThemeSummary,
}

impl ExtractionSummary {
    pub fn from_entities(entities: &ExtractedEntities) -> Self {
        let years: BTreeSet<i32> = entities.dates.iter().map(|d| d.year).collect();
        let centuries: BTreeSet<String> = entities.dates.iter().map(|d| d.century.clone()).collect();
        let latest = entities
            .dates
            .iter()
            .map(|d| d.year_end.unwrap_or(d.year))
            .max();

        let first_names: BTreeSet<String> =
            entities.names.iter().map(|n| n.first_name.clone()).collect();
        let last_names: BTreeSet<String> =
            entities.names.iter().map(|n| n.last_name.clone()).collect();
        let regions: BTreeSet<String> = entities.places.iter().map(|p| p.region.clone()).collect();
        let exact = entities
            .places
            .iter()
            .filter(|p| p.match_kind == MatchKind::Exact)
            .count();

        Self {
            dates: DateSummary {
                count: entities.dates.len(),
                earliest_year: years.first().copied(),
                latest_year: latest,
                years: years.into_iter().collect(),
                centuries: centuries.into_iter().collect(),
            },
            names: NameSummary {
                count: entities.names.len(),
                high_confidence: entities
                    .names
                    .iter()
                    .filter(|n| n.confidence > HIGH_CONFIDENCE)
                    .count(),
                unique_first_names: first_names.into_iter().collect(),
                unique_last_names: last_names.into_iter().collect(),
            },
            places: PlaceSummary {
                count: entities.places.len(),
                regions: regions.into_iter().collect(),
                exact_matches: exact,
                fuzzy_matches: entities.places.len() - exact,
            },
            themes: ThemeSummary {
                count: entities.themes.len(),
                categories: entities.themes.iter().map(|t| t.category.clone()).collect(),
                top_category: entities.themes.first().map(|t| t.category.clone()),
            },
        }
    }
}
