//! Name dictionaries and the structural name pattern.

use std::collections::HashSet;

use regex::Regex;
use serde::Deserialize;

use super::{ReferenceError, NAMES_FILE};
use crate::extraction::normalize::fold;

const UPPER: &str = "A-ZÁÀÂÃÉÊÍÓÔÕÚÇ";
const LOWER: &str = "a-záàâãéêíóôõúç";

#[derive(Deserialize)]
struct RawNames {
    first_names: Vec<String>,
    second_names: Vec<String>,
    #[serde(default)]
    prepositions: Vec<String>,
}

/// A folded word list with constant-time membership checks.
#[derive(Debug, Default)]
pub struct NameList {
    words: Vec<String>,
    index: HashSet<String>,
}

impl NameList {
    fn new(raw: &[String]) -> Self {
        let mut words = Vec::with_capacity(raw.len());
        let mut index = HashSet::with_capacity(raw.len());
        for word in raw {
            let folded = fold(word.trim());
            if !folded.is_empty() && index.insert(folded.clone()) {
                words.push(folded);
            }
        }
        Self { words, index }
    }

    /// Membership of an already folded word.
    pub fn contains(&self, folded: &str) -> bool {
        self.index.contains(folded)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// First and last name dictionaries plus the pattern locating candidates.
///
/// The pattern matches a capitalized word, an optional connecting
/// preposition, then one or more capitalized words (prepositions may also
/// join the trailing words, as in "Martim Afonso de Sousa"). Group 1 is the
/// first name and group 2 the rest.
#[derive(Debug)]
pub struct NameDictionary {
    first: NameList,
    last: NameList,
    prepositions: Vec<String>,
    pattern: Regex,
}

impl NameDictionary {
    pub fn from_json(json: &str) -> Result<Self, ReferenceError> {
        let raw: RawNames = serde_json::from_str(json).map_err(|source| ReferenceError::Json {
            file: NAMES_FILE,
            source,
        })?;

        let first = NameList::new(&raw.first_names);
        let last = NameList::new(&raw.second_names);
        if first.is_empty() || last.is_empty() {
            return Err(ReferenceError::Invalid {
                file: NAMES_FILE,
                message: "first_names and second_names must not be empty".to_string(),
            });
        }

        let prepositions: Vec<String> = raw
            .prepositions
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        let pattern = build_pattern(&prepositions).map_err(|source| {
            ReferenceError::InvalidPattern {
                file: NAMES_FILE,
                name: "prepositions".to_string(),
                source,
            }
        })?;

        Ok(Self {
            first,
            last,
            prepositions,
            pattern,
        })
    }

    pub fn first_names(&self) -> &NameList {
        &self.first
    }

    pub fn last_names(&self) -> &NameList {
        &self.last
    }

    pub fn is_preposition(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.prepositions.iter().any(|p| *p == word)
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

fn build_pattern(prepositions: &[String]) -> Result<Regex, regex::Error> {
    let word = format!("[{}][{}]+", UPPER, LOWER);
    let joiner = if prepositions.is_empty() {
        r"\s+".to_string()
    } else {
        let alternatives: Vec<String> = prepositions.iter().map(|p| regex::escape(p)).collect();
        format!(r"\s+(?:(?:{})\s+)?", alternatives.join("|"))
    };
    Regex::new(&format!(
        r"\b({word}){joiner}({word}(?:{joiner}{word})*)",
        word = word,
        joiner = joiner
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> NameDictionary {
        NameDictionary::from_json(include_str!("../../config/reference/names.json")).unwrap()
    }

    #[test]
    fn test_lists_are_folded() {
        let names = dictionary();
        assert!(names.first_names().contains("joao"));
        assert!(names.last_names().contains("goncalves"));
        assert!(!names.first_names().contains("João"));
    }

    #[test]
    fn test_pattern_captures_preposition_names() {
        let names = dictionary();
        let caps = names
            .pattern()
            .captures("doada a Martim Afonso de Sousa em")
            .unwrap();
        assert_eq!(&caps[1], "Martim");
        assert_eq!(&caps[2], "Afonso de Sousa");

        let caps = names.pattern().captures("por Duarte Coelho.").unwrap();
        assert_eq!(&caps[1], "Duarte");
        assert_eq!(&caps[2], "Coelho");
    }

    #[test]
    fn test_pattern_requires_two_words() {
        let names = dictionary();
        assert!(names.pattern().captures("Salvador, Bahia").is_none());
    }

    #[test]
    fn test_empty_dictionary_rejected() {
        let json = r#"{"first_names": [], "second_names": ["Silva"]}"#;
        assert!(matches!(
            NameDictionary::from_json(json),
            Err(ReferenceError::Invalid { .. })
        ));
    }
}
