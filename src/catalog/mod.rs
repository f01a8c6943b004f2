//! Topic catalog and category selection
//!
//! The catalog is static data: each category key maps to an ordered list of
//! search topics. A run selects either every category or a named subset,
//! and the selection is expanded into `Topic`s in catalog order.

mod topics;

use serde::{Deserialize, Serialize};

use topics::CATALOG;

/// One search topic within a category. Identity is the pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    pub category: String,
    pub name: String,
}

impl Topic {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.category, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown category '{0}' (valid: {names})", names = category_names().join(", "))]
    UnknownCategory(String),

    #[error("Category selection is empty")]
    EmptySelection,
}

/// Which categories a run covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySelection {
    #[default]
    All,
    Named(Vec<String>),
}

impl CategorySelection {
    /// Parse `ALL` or a comma-separated list of category names.
    ///
    /// Names are trimmed, upper-cased and `/` becomes `_`, so
    /// `food/cooking` selects `FOOD_COOKING`. Repeated names collapse to one.
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        let mut names: Vec<String> = Vec::new();
        for part in trimmed.split(',') {
            let key = normalize_category(part);
            if key.is_empty() {
                continue;
            }
            if key == "ALL" {
                return Ok(Self::All);
            }
            if !is_known_category(&key) {
                return Err(CatalogError::UnknownCategory(part.trim().to_string()));
            }
            if !names.contains(&key) {
                names.push(key);
            }
        }

        if names.is_empty() {
            return Err(CatalogError::EmptySelection);
        }
        Ok(Self::Named(names))
    }

    /// Category keys covered by this selection, in selection order.
    #[must_use]
    pub fn categories(&self) -> Vec<&'static str> {
        match self {
            Self::All => category_names(),
            Self::Named(names) => names
                .iter()
                .filter_map(|n| CATALOG.iter().find(|(key, _)| *key == n.as_str()).map(|(key, _)| *key))
                .collect(),
        }
    }
}

impl std::fmt::Display for CategorySelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Named(names) => f.write_str(&names.join(",")),
        }
    }
}

/// Canonical key form of a user-supplied category name.
#[must_use]
pub fn normalize_category(name: &str) -> String {
    name.trim().to_uppercase().replace('/', "_")
}

#[must_use]
pub fn is_known_category(key: &str) -> bool {
    CATALOG.iter().any(|(k, _)| *k == key)
}

/// All category keys in catalog order.
#[must_use]
pub fn category_names() -> Vec<&'static str> {
    CATALOG.iter().map(|(key, _)| *key).collect()
}

/// Topics of one category, or `None` if the key is unknown.
#[must_use]
pub fn topics_for(category: &str) -> Option<&'static [&'static str]> {
    CATALOG
        .iter()
        .find(|(key, _)| *key == category)
        .map(|(_, topics)| *topics)
}

/// Expand a selection into the ordered list of topics to scrape.
#[must_use]
pub fn resolve(selection: &CategorySelection) -> Vec<Topic> {
    selection
        .categories()
        .into_iter()
        .flat_map(|category| {
            topics_for(category)
                .unwrap_or_default()
                .iter()
                .map(move |name| Topic::new(category, *name))
        })
        .collect()
}

#[must_use]
pub fn topic_count() -> usize {
    CATALOG.iter().map(|(_, topics)| topics.len()).sum()
}
