//! Theme taxonomy: category names mapped to keyword lists.

use std::collections::BTreeMap;

use super::{ReferenceError, THEMES_FILE};

#[derive(Debug, Clone)]
pub struct ThemeCategory {
    pub name: String,
    /// Keywords as configured.
    pub keywords: Vec<String>,
    /// Lower-cased keywords, parallel to `keywords`.
    pub lowered: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ThemeTaxonomy {
    categories: Vec<ThemeCategory>,
}

impl ThemeTaxonomy {
    pub fn from_json(json: &str) -> Result<Self, ReferenceError> {
        let raw: BTreeMap<String, Vec<String>> =
            serde_json::from_str(json).map_err(|source| ReferenceError::Json {
                file: THEMES_FILE,
                source,
            })?;

        let mut categories = Vec::with_capacity(raw.len());
        for (name, keywords) in raw {
            let keywords: Vec<String> = keywords
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
            if keywords.is_empty() {
                return Err(ReferenceError::Invalid {
                    file: THEMES_FILE,
                    message: format!("category `{}` has no keywords", name),
                });
            }
            let lowered = keywords.iter().map(|k| k.to_lowercase()).collect();
            categories.push(ThemeCategory {
                name,
                keywords,
                lowered,
            });
        }

        if categories.is_empty() {
            return Err(ReferenceError::Invalid {
                file: THEMES_FILE,
                message: "no categories defined".to_string(),
            });
        }

        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[ThemeCategory] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_lowered() {
        let taxonomy = ThemeTaxonomy::from_json(r#"{"religiao": ["Igreja", " padre "]}"#).unwrap();
        let category = &taxonomy.categories()[0];
        assert_eq!(category.keywords, vec!["Igreja", "padre"]);
        assert_eq!(category.lowered, vec!["igreja", "padre"]);
    }

    #[test]
    fn test_empty_category_rejected() {
        assert!(ThemeTaxonomy::from_json(r#"{"vazio": []}"#).is_err());
        assert!(ThemeTaxonomy::from_json("{}").is_err());
    }
}
