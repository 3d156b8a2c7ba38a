//! Entities located in document text.
//!
//! Positions are zero-based character offsets into the text the entity was
//! extracted from. Every confidence and relevance value lies in `[0.0, 1.0]`.

use serde::{Deserialize, Serialize};

/// How a date was expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateKind {
    /// A four-digit year.
    Explicit,
    /// A century phrase, optionally narrowed by a period qualifier.
    Textual,
}

impl DateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Textual => "textual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateEntity {
    pub kind: DateKind,
    /// The year, or the first year of the range for textual dates.
    pub year: i32,
    /// Last year of the range for textual dates.
    pub year_end: Option<i32>,
    pub century: String,
    /// Period qualifier as written, e.g. "primeira metade".
    pub period_label: Option<String>,
    /// Matched text.
    pub source_span: String,
    pub position: usize,
    pub confidence: f64,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameEntity {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub position: usize,
    pub confidence: f64,
    pub context: String,
}

/// How a place was matched against the gazetteer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceEntity {
    /// Gazetteer spelling of the location.
    pub location: String,
    /// Administrative region the location belongs to.
    pub region: String,
    pub position: usize,
    pub confidence: f64,
    pub match_kind: MatchKind,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeEntity {
    pub category: String,
    pub matched_keywords: Vec<String>,
    pub occurrence_count: usize,
    pub relevance_score: f64,
    pub sample_contexts: Vec<String>,
}

/// Any single extracted entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entity {
    Date(DateEntity),
    Name(NameEntity),
    Place(PlaceEntity),
    Theme(ThemeEntity),
}

impl Entity {
    /// Confidence, or relevance score for themes.
    pub fn confidence(&self) -> f64 {
        match self {
            Entity::Date(d) => d.confidence,
            Entity::Name(n) => n.confidence,
            Entity::Place(p) => p.confidence,
            Entity::Theme(t) => t.relevance_score,
        }
    }
}

/// The four entity lists produced for one text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub dates: Vec<DateEntity>,
    pub names: Vec<NameEntity>,
    pub places: Vec<PlaceEntity>,
    pub themes: Vec<ThemeEntity>,
}

impl ExtractedEntities {
    pub fn len(&self) -> usize {
        self.dates.len() + self.names.len() + self.places.len() + self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into tagged entities.
    pub fn into_entities(self) -> Vec<Entity> {
        let mut entities = Vec::with_capacity(self.len());
        entities.extend(self.dates.into_iter().map(Entity::Date));
        entities.extend(self.names.into_iter().map(Entity::Name));
        entities.extend(self.places.into_iter().map(Entity::Place));
        entities.extend(self.themes.into_iter().map(Entity::Theme));
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_serializes_with_type_tag() {
        let entity = Entity::Place(PlaceEntity {
            location: "Olinda".to_string(),
            region: "Pernambuco".to_string(),
            position: 4,
            confidence: 1.0,
            match_kind: MatchKind::Exact,
            context: "Em Olinda".to_string(),
        });
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "place");
        assert_eq!(json["match_kind"], "exact");
        assert_eq!(entity.confidence(), 1.0);
    }

    #[test]
    fn test_into_entities_keeps_every_list() {
        let entities = ExtractedEntities {
            themes: vec![ThemeEntity {
                category: "terras".to_string(),
                matched_keywords: vec!["sesmaria".to_string()],
                occurrence_count: 2,
                relevance_score: 0.4,
                sample_contexts: vec![],
            }],
            ..Default::default()
        };
        assert_eq!(entities.len(), 1);
        let flat = entities.into_entities();
        assert!(matches!(flat[0], Entity::Theme(_)));
        assert_eq!(flat[0].confidence(), 0.4);
    }
}
