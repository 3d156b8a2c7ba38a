//! Date recognition patterns and century/period tables.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use super::{ReferenceError, DATE_CONFIG_FILE};

#[derive(Deserialize)]
struct RawDateConfig {
    regex_patterns: RawPatterns,
    century_map: HashMap<String, i32>,
    #[serde(default)]
    part_map: HashMap<String, [u32; 2]>,
}

#[derive(Deserialize)]
struct RawPatterns {
    year: String,
    textual_phrase: String,
}

/// Compiled date patterns.
///
/// The `year` pattern captures a four-digit year in the named group `year`.
/// The `textual_phrase` pattern captures a century in `century` and may
/// capture a period qualifier in `part`. Both match case-insensitively.
#[derive(Debug)]
pub struct DatePatterns {
    pub year: Regex,
    pub textual_phrase: Regex,
    /// Lower-cased keys, longest first.
    centuries: Vec<(String, i32)>,
    /// Lower-cased keys, longest first; values are start/end percentages.
    parts: Vec<(String, (u32, u32))>,
}

impl DatePatterns {
    pub fn from_json(json: &str) -> Result<Self, ReferenceError> {
        let raw: RawDateConfig =
            serde_json::from_str(json).map_err(|source| ReferenceError::Json {
                file: DATE_CONFIG_FILE,
                source,
            })?;

        let year = compile("year", &raw.regex_patterns.year)?;
        require_group(&year, "year", "year")?;
        let textual_phrase = compile("textual_phrase", &raw.regex_patterns.textual_phrase)?;
        require_group(&textual_phrase, "textual_phrase", "century")?;

        if raw.century_map.is_empty() {
            return Err(ReferenceError::Invalid {
                file: DATE_CONFIG_FILE,
                message: "century_map is empty".to_string(),
            });
        }

        let mut centuries: Vec<(String, i32)> = raw
            .century_map
            .into_iter()
            .map(|(key, year)| (normalize_key(&key), year))
            .collect();
        sort_longest_first(&mut centuries);

        let mut parts = Vec::with_capacity(raw.part_map.len());
        for (key, [start, end]) in raw.part_map {
            if start > end || end > 100 {
                return Err(ReferenceError::Invalid {
                    file: DATE_CONFIG_FILE,
                    message: format!("part_map entry `{}` has invalid range [{}, {}]", key, start, end),
                });
            }
            parts.push((normalize_key(&key), (start, end)));
        }
        sort_longest_first(&mut parts);

        Ok(Self {
            year,
            textual_phrase,
            centuries,
            parts,
        })
    }

    /// Base year for a matched century text, e.g. `"XVI"` gives 1500.
    /// Only an exact key matches, so `"XXI"` never falls back to `"XX"`.
    pub fn century_base(&self, century: &str) -> Option<i32> {
        let century = normalize_key(century);
        self.centuries
            .iter()
            .find(|(key, _)| *key == century)
            .map(|(_, year)| *year)
    }

    /// Percent range for a matched period qualifier, e.g. `"primeira metade"`.
    pub fn part_range(&self, part: &str) -> Option<(u32, u32)> {
        lookup_contained(&self.parts, part).copied()
    }
}

fn compile(name: &'static str, pattern: &str) -> Result<Regex, ReferenceError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ReferenceError::InvalidPattern {
            file: DATE_CONFIG_FILE,
            name: name.to_string(),
            source,
        })
}

fn require_group(
    regex: &Regex,
    name: &'static str,
    group: &'static str,
) -> Result<(), ReferenceError> {
    if regex.capture_names().flatten().any(|n| n == group) {
        Ok(())
    } else {
        Err(ReferenceError::MissingGroup {
            file: DATE_CONFIG_FILE,
            name,
            group,
        })
    }
}

fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn sort_longest_first<T>(entries: &mut [(String, T)]) {
    entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
}

/// Exact key match first, then the longest key contained in the text.
fn lookup_contained<'a, T>(entries: &'a [(String, T)], text: &str) -> Option<&'a T> {
    let text = normalize_key(text);
    entries
        .iter()
        .find(|(key, _)| *key == text)
        .or_else(|| entries.iter().find(|(key, _)| text.contains(key.as_str())))
        .map(|(_, value)| value)
}
