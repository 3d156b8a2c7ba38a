//! Reference datasets consumed by the entity extraction engine.
//!
//! Four datasets are read once from a directory at startup:
//!
//! | file | contents |
//! |---|---|
//! | `date_config.json` | year and century-phrase patterns, century and period tables |
//! | `names.json` | first names, last names and connecting prepositions |
//! | `places.txt` | gazetteer, one `location, region` per line |
//! | `themes.json` | theme categories and their keywords |
//!
//! Everything is validated while loading; a missing file, key or malformed
//! entry is an error, so a bad configuration stops the process before any
//! document is touched.

mod dates;
mod names;
mod places;
mod themes;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use dates::DatePatterns;
pub use names::{NameDictionary, NameList};
pub use places::{Gazetteer, PlaceEntry};
pub use themes::{ThemeCategory, ThemeTaxonomy};

pub const DATE_CONFIG_FILE: &str = "date_config.json";
pub const NAMES_FILE: &str = "names.json";
pub const PLACES_FILE: &str = "places.txt";
pub const THEMES_FILE: &str = "themes.json";

/// Errors loading reference data.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("reference file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {file}: {source}")]
    Json {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{file}: pattern `{name}` does not define the `{group}` capture group")]
    MissingGroup {
        file: &'static str,
        name: &'static str,
        group: &'static str,
    },

    #[error("{file}: invalid pattern `{name}`: {source}")]
    InvalidPattern {
        file: &'static str,
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("{file}: {message}")]
    Invalid { file: &'static str, message: String },
}

/// The four loaded datasets. Immutable once built.
#[derive(Debug)]
pub struct ReferenceData {
    pub dates: DatePatterns,
    pub names: NameDictionary,
    pub places: Gazetteer,
    pub themes: ThemeTaxonomy,
}

impl ReferenceData {
    /// Load and validate all datasets from `dir`.
    pub fn load(dir: &Path) -> Result<Self, ReferenceError> {
        let date_config = read_file(dir, DATE_CONFIG_FILE)?;
        let names = read_file(dir, NAMES_FILE)?;
        let places = read_file(dir, PLACES_FILE)?;
        let themes = read_file(dir, THEMES_FILE)?;

        let data = Self::from_sources(&date_config, &names, &places, &themes)?;
        tracing::info!(
            dir = %dir.display(),
            first_names = data.names.first_names().len(),
            last_names = data.names.last_names().len(),
            places = data.places.len(),
            themes = data.themes.len(),
            "Loaded reference data"
        );
        Ok(data)
    }

    /// Build from file contents already in memory.
    pub fn from_sources(
        date_config: &str,
        names: &str,
        places: &str,
        themes: &str,
    ) -> Result<Self, ReferenceError> {
        Ok(Self {
            dates: DatePatterns::from_json(date_config)?,
            names: NameDictionary::from_json(names)?,
            places: Gazetteer::parse(places)?,
            themes: ThemeTaxonomy::from_json(themes)?,
        })
    }

    /// The datasets shipped in `config/reference`.
    #[cfg(test)]
    pub(crate) fn bundled() -> Self {
        Self::from_sources(
            include_str!("../../config/reference/date_config.json"),
            include_str!("../../config/reference/names.json"),
            include_str!("../../config/reference/places.txt"),
            include_str!("../../config/reference/themes.json"),
        )
        .expect("bundled reference data is valid")
    }
}

fn read_file(dir: &Path, name: &str) -> Result<String, ReferenceError> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(ReferenceError::Missing(path));
    }
    std::fs::read_to_string(&path).map_err(|source| ReferenceError::Io { path, source })
}
