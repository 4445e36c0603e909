//! Reward items and the collections that group them.

use serde::{Deserialize, Serialize};

/// A single collectible reward, identified by its image source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RewardItem {
    /// Image URI (relative to the asset root), e.g. `/assets/collections/pixel_dogs/dog_7lb.png`
    pub image_source: String,
    /// Accessible label passed through to the rendered tile
    pub label: String,
}

impl RewardItem {
    pub fn new(image_source: impl Into<String>, label: impl Into<String>) -> Self {
        Self { image_source: image_source.into(), label: label.into() }
    }
}

/// Visual treatment of a tile before (and after) it is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SilhouetteStyle {
    /// Opaque pixels painted as a flat silhouette
    #[default]
    Mask,
    /// Darkened greyscale copy of the image
    Image,
}

/// A named, ordered group of reward items rendered as one grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub title: String,
    /// Ribbon shown above the grid (e.g. "Unlockable - Pixel Dogs")
    pub ribbon_text: String,
    #[serde(default)]
    pub is_included_by_default: bool,
    pub items: Vec<RewardItem>,
    #[serde(default)]
    pub silhouette_style: SilhouetteStyle,
}

impl Collection {
    /// Number of items in the collection.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
