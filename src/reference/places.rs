//! Gazetteer of known places.

use super::{ReferenceError, PLACES_FILE};
use crate::extraction::normalize::fold;

/// A gazetteer entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceEntry {
    pub location: String,
    pub region: String,
    /// Folded location used for matching.
    pub normalized: String,
}

#[derive(Debug, Default)]
pub struct Gazetteer {
    entries: Vec<PlaceEntry>,
}

impl Gazetteer {
    /// Parse `location, region` lines. Blank lines and `#` comments are
    /// ignored; the region is everything after the first comma.
    pub fn parse(contents: &str) -> Result<Self, ReferenceError> {
        let mut entries = Vec::new();

        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((location, region)) = line.split_once(',') else {
                return Err(ReferenceError::Invalid {
                    file: PLACES_FILE,
                    message: format!("line {}: expected `location, region`", number + 1),
                });
            };
            let (location, region) = (location.trim(), region.trim());
            if location.is_empty() || region.is_empty() {
                return Err(ReferenceError::Invalid {
                    file: PLACES_FILE,
                    message: format!("line {}: empty location or region", number + 1),
                });
            }
            entries.push(PlaceEntry {
                location: location.to_string(),
                region: region.to_string(),
                normalized: fold(location),
            });
        }

        if entries.is_empty() {
            return Err(ReferenceError::Invalid {
                file: PLACES_FILE,
                message: "no places defined".to_string(),
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PlaceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
