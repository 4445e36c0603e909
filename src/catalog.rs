//! Reward catalog
//!
//! Collections are built once at startup from a deterministic naming pattern
//! (`{prefix}{weight}lb.{ext}` for weights `1..=count`) and are read-only
//! afterwards. The catalog is passed by reference to whatever mounts grids.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Collection, RewardItem, SilhouetteStyle};

/// Reward weights per collection (1 lb .. 100 lb).
pub const DEFAULT_WEIGHT_COUNT: u32 = 100;

/// Weights with no instrument artwork.
pub const EXCLUDED_INSTRUMENT_WEIGHTS: &[u32] = &[
    18, 27, 34, 38, 44, 47, 49, 52, 54, 55, 56, 59, 60, 61, 64, 65, 68, 70, 73, 75, 76, 81, 83, 86,
    87, 91, 92, 95, 98,
];

/// Error looking up a collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown collection '{id}' (available: {})", available.join(", "))]
    UnknownCollection { id: String, available: Vec<String> },
}

/// Image source for one weight of a collection.
pub fn item_source(folder: &str, prefix: &str, weight: u32, extension: &str) -> String {
    format!("/assets/collections/{}/{}{}lb.{}", folder, prefix, weight, extension)
}

/// How to generate a collection's items from its asset naming scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPattern {
    pub id: String,
    pub title: String,
    /// Ribbon text; derived from `included` and `title` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ribbon: Option<String>,
    #[serde(default)]
    pub included: bool,
    #[serde(default)]
    pub silhouette: SilhouetteStyle,
    /// Asset folder under `/assets/collections/`
    pub folder: String,
    /// File name prefix, e.g. `dog_`
    pub prefix: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Label prefix, e.g. `Pixel dog` gives `Pixel dog 7 lb`
    pub label_prefix: String,
    #[serde(default = "default_count")]
    pub count: u32,
    /// Weights to leave out
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<u32>,
}

fn default_extension() -> String {
    "png".to_string()
}

fn default_count() -> u32 {
    DEFAULT_WEIGHT_COUNT
}

impl CollectionPattern {
    fn new(
        id: &str,
        title: &str,
        silhouette: SilhouetteStyle,
        prefix: &str,
        extension: &str,
        label_prefix: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            ribbon: None,
            included: false,
            silhouette,
            folder: id.to_string(),
            prefix: prefix.to_string(),
            extension: extension.to_string(),
            label_prefix: label_prefix.to_string(),
            count: DEFAULT_WEIGHT_COUNT,
            exclude: Vec::new(),
        }
    }

    fn included(mut self, ribbon: &str) -> Self {
        self.included = true;
        self.ribbon = Some(ribbon.to_string());
        self
    }

    fn excluding(mut self, weights: &[u32]) -> Self {
        self.exclude = weights.to_vec();
        self
    }

    /// Ribbon text shown above the grid.
    pub fn ribbon_text(&self) -> String {
        match &self.ribbon {
            Some(ribbon) => ribbon.clone(),
            None if self.included => format!("INCLUDED - {}", self.title),
            None => format!("Unlockable - {}", self.title),
        }
    }

    /// Items for weights `1..=count`, skipping excluded weights.
    pub fn items(&self) -> Vec<RewardItem> {
        (1..=self.count)
            .filter(|weight| !self.exclude.contains(weight))
            .map(|weight| {
                RewardItem::new(
                    item_source(&self.folder, &self.prefix, weight, &self.extension),
                    format!("{} {} lb", self.label_prefix, weight),
                )
            })
            .collect()
    }

    pub fn build(&self) -> Collection {
        Collection {
            id: self.id.clone(),
            title: self.title.clone(),
            ribbon_text: self.ribbon_text(),
            is_included_by_default: self.included,
            items: self.items(),
            silhouette_style: self.silhouette,
        }
    }
}

/// Patterns for the built-in catalog.
pub fn default_patterns() -> Vec<CollectionPattern> {
    use SilhouetteStyle::{Image, Mask};
    vec![
        CollectionPattern::new("pixel_animals", "Pixel Animals", Mask, "animal_", "png", "Pixel animal")
            .included("INCLUDED - pixel animals"),
        CollectionPattern::new("pixel_dogs", "Pixel Dogs", Mask, "dog_", "png", "Pixel dog"),
        CollectionPattern::new("pixel_objects", "Pixel Objects", Mask, "object_", "png", "Pixel object"),
        CollectionPattern::new("pixel_instruments", "Pixel Instruments", Mask, "instrument_", "png", "Pixel instrument")
            .excluding(EXCLUDED_INSTRUMENT_WEIGHTS),
        CollectionPattern::new("clay_animals", "Clay Animals", Image, "clay_animal_", "jpg", "Clay animal"),
        CollectionPattern::new("clay_dogs", "Clay Dogs", Image, "clay_dog_", "jpg", "Clay dog"),
        CollectionPattern::new("clay_objects", "Clay Objects", Image, "clay_object_", "jpg", "Clay object"),
        CollectionPattern::new("clay_instruments", "Clay Instruments", Image, "clay_instrument_", "jpg", "Clay instrument")
            .excluding(EXCLUDED_INSTRUMENT_WEIGHTS),
    ]
}

/// The immutable set of collections shown on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    collections: Vec<Collection>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::from_patterns(&default_patterns())
    }
}

impl Catalog {
    pub fn new(collections: Vec<Collection>) -> Self {
        Self { collections }
    }

    pub fn from_patterns(patterns: &[CollectionPattern]) -> Self {
        Self::new(patterns.iter().map(CollectionPattern::build).collect())
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Look up a collection by id.
    pub fn get(&self, id: &str) -> Result<&Collection, CatalogError> {
        self.collections.iter().find(|c| c.id == id).ok_or_else(|| CatalogError::UnknownCollection {
            id: id.to_string(),
            available: self.collections.iter().map(|c| c.id.clone()).collect(),
        })
    }

    /// A catalog holding only the collection with `id`.
    pub fn only(&self, id: &str) -> Result<Catalog, CatalogError> {
        Ok(Catalog::new(vec![self.get(id)?.clone()]))
    }
}
