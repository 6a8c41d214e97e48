use super::models::CatalogEntry;
use crate::config::ConfigError;

/// Immutable, non-empty list of entries the selector picks from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog, rejecting an empty entry list.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        Ok(Self { entries })
    }

    /// Build a catalog from two parallel lists; both must have the same length.
    pub fn from_parallel(titles: &[&str], descriptions: &[&str]) -> Result<Self, ConfigError> {
        if titles.len() != descriptions.len() {
            return Err(ConfigError::CatalogLengthMismatch {
                titles: titles.len(),
                descriptions: descriptions.len(),
            });
        }
        Self::new(
            titles
                .iter()
                .zip(descriptions)
                .map(|(t, d)| CatalogEntry::new(*t, *d))
                .collect(),
        )
    }

    /// The built-in catalog of Arequipa landmarks.
    pub fn arequipa() -> Self {
        let entries = AREQUIPA_LANDMARKS
            .iter()
            .map(|(t, d)| CatalogEntry::new(*t, *d))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

const AREQUIPA_LANDMARKS: [(&str, &str); 8] = [
    ("Yanahuara Viewpoint", "Panoramic view of the Misti volcano"),
    ("Santa Catalina Monastery", "16th century colonial architecture"),
    ("Plaza de Armas", "Historic center of Arequipa"),
    ("Colca Canyon", "Home of the Andean condor"),
    ("Mundo Alpaca", "Textiles and South American camelids"),
    ("Misti Volcano", "Active volcano at 5,822 m above sea level"),
    ("La Cau Cau Picanteria", "Traditional Arequipa cuisine"),
    ("La Recoleta Monastery", "Franciscan history since 1648"),
];
