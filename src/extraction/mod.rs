//! Rule-based entity extraction.
//!
//! Dates, person names, places and themes are located with patterns and
//! dictionary lookups from [`ReferenceData`], scored, deduplicated within
//! their own list, and sorted. Extraction never fails; an empty list is a
//! valid result.

pub mod context;
pub mod dates;
pub mod names;
pub mod normalize;
pub mod places;
pub mod similarity;
mod summary;
pub mod themes;

use std::sync::Arc;

pub use context::SourceText;
pub use dates::century_label;
pub use similarity::similarity;
pub use summary::{DateSummary, ExtractionSummary, NameSummary, PlaceSummary, ThemeSummary};

use crate::config::ExtractionParams;
use crate::models::{DateEntity, ExtractedEntities, NameEntity, PlaceEntity, ThemeEntity};
use crate::reference::ReferenceData;
use themes::ThemeOptions;

/// Extracts all entity kinds from text using shared reference data.
pub struct EntityExtractor {
    reference: Arc<ReferenceData>,
    params: ExtractionParams,
}

impl EntityExtractor {
    pub fn new(reference: Arc<ReferenceData>, params: ExtractionParams) -> Self {
        Self { reference, params }
    }

    pub fn params(&self) -> &ExtractionParams {
        &self.params
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Run all four extractions over `text`.
    pub fn extract_all(&self, text: &str) -> ExtractedEntities {
        let source = SourceText::new(text);
        let entities = ExtractedEntities {
            dates: self.dates_in(&source),
            names: self.names_in(&source),
            places: self.places_in(&source),
            themes: self.themes_in(&source),
        };
        tracing::debug!(
            dates = entities.dates.len(),
            names = entities.names.len(),
            places = entities.places.len(),
            themes = entities.themes.len(),
            "Extracted entities"
        );
        entities
    }

    pub fn extract_dates(&self, text: &str) -> Vec<DateEntity> {
        self.dates_in(&SourceText::new(text))
    }

    pub fn extract_names(&self, text: &str) -> Vec<NameEntity> {
        self.names_in(&SourceText::new(text))
    }

    pub fn extract_places(&self, text: &str) -> Vec<PlaceEntity> {
        self.places_in(&SourceText::new(text))
    }

    pub fn extract_themes(&self, text: &str) -> Vec<ThemeEntity> {
        self.themes_in(&SourceText::new(text))
    }

    fn dates_in(&self, source: &SourceText<'_>) -> Vec<DateEntity> {
        dates::extract_dates(
            source,
            &self.reference.dates,
            self.params.context_window,
            self.params.date_bucket_size,
        )
    }

    fn names_in(&self, source: &SourceText<'_>) -> Vec<NameEntity> {
        names::extract_names(
            source,
            &self.reference.names,
            self.params.context_window,
            self.params.fuzzy_threshold,
            self.params.name_min_confidence,
        )
    }

    fn places_in(&self, source: &SourceText<'_>) -> Vec<PlaceEntity> {
        places::extract_places(
            source,
            &self.reference.places,
            self.params.context_window,
            self.params.fuzzy_threshold,
        )
    }

    fn themes_in(&self, source: &SourceText<'_>) -> Vec<ThemeEntity> {
        themes::extract_themes(
            source,
            &self.reference.themes,
            ThemeOptions {
                window: self.params.theme_context_window,
                max_contexts: self.params.theme_max_contexts,
                min_score: self.params.theme_min_score,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARTA: &str = "Carta de doação de 1532, século XVI, primeira metade. \
        El-Rei fez mercê a Martim Afonso de Sousa da capitania de São Vicente, \
        com sesmarias e terras para engenho de açúcar. Em 1534 Duarte Coelho \
        recebeu Pernambuco e fundou a vila de Olinda, onde se ergueu a igreja.";

    fn extractor() -> EntityExtractor {
        EntityExtractor::new(Arc::new(ReferenceData::bundled()), ExtractionParams::default())
    }

    #[test]
    fn test_extract_all_finds_every_kind() {
        let entities = extractor().extract_all(CARTA);
        assert!(entities.dates.iter().any(|d| d.year == 1532));
        assert!(entities.dates.iter().any(|d| d.year == 1534));
        assert!(entities.names.iter().any(|n| n.full_name == "Martim Afonso de Sousa"));
        assert!(entities.names.iter().any(|n| n.full_name == "Duarte Coelho"));
        assert!(entities.places.iter().any(|p| p.location == "São Vicente"));
        assert!(entities.places.iter().any(|p| p.location == "Olinda"));
        assert!(entities.themes.iter().any(|t| t.category == "terras"));
    }

    #[test]
    fn test_every_confidence_in_unit_interval() {
        let texts = [
            CARTA,
            "",
            "1500 1600 1700 1800 1900 2000 século XV século XX fim",
            "Recyfe Olynda Salvadr Itamaraka Ilheos Bellem Natall",
            "Joao Silv, Pedru Pereyra, Ana Souza, Maria Sá",
        ];
        let extractor = extractor();
        for text in texts {
            for entity in extractor.extract_all(text).into_entities() {
                let c = entity.confidence();
                assert!((0.0..=1.0).contains(&c), "{:?}", entity);
            }
        }
    }

    #[test]
    fn test_empty_text_yields_empty_lists() {
        assert!(extractor().extract_all("").is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = extractor();
        assert_eq!(extractor.extract_all(CARTA), extractor.extract_all(CARTA));
    }
}
