//! Configuration schema types for `rvl.toml`
//!
//! Defines the structure and validation rules for the showcase configuration.
//! Every field has a default, so an empty file is a valid config.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::catalog::{default_patterns, Catalog, CollectionPattern};
use crate::columns::{
    ColumnLayout, DEFAULT_GAP, DEFAULT_INITIAL_COLUMNS, DEFAULT_PADDING, DEFAULT_TILE_SIZE,
};
use crate::grid::GridSettings;
use crate::image_source::DEFAULT_FALLBACK_SOURCE;
use crate::lit_set::{DEFAULT_LIT_COUNT, DEFAULT_ROTATION_MS};
use crate::reveal::{RevealTiming, DEFAULT_HIDE_DELAY_MS, DEFAULT_REVEAL_TICK_MS};
use crate::timer::Millis;

/// Grid geometry section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Tile side in pixels
    pub tile_size: u32,
    /// Gap between tiles in pixels
    pub gap: u32,
    /// Container padding and scrollbar allowance in pixels
    pub padding: u32,
    /// Rows of tiles per grid
    pub rows: usize,
    /// Columns assumed before the first width observation
    pub initial_columns: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            gap: DEFAULT_GAP,
            padding: DEFAULT_PADDING,
            rows: 1,
            initial_columns: DEFAULT_INITIAL_COLUMNS,
        }
    }
}

/// Animation timing section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Interval between chunk paints
    pub reveal_tick_ms: Millis,
    /// Grace delay before a hidden tile clears
    pub hide_delay_ms: Millis,
    /// Lit-set rotation period
    pub rotation_ms: Millis,
    /// Lit tiles per grid
    pub lit_count: usize,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            reveal_tick_ms: DEFAULT_REVEAL_TICK_MS,
            hide_delay_ms: DEFAULT_HIDE_DELAY_MS,
            rotation_ms: DEFAULT_ROTATION_MS,
            lit_count: DEFAULT_LIT_COUNT,
        }
    }
}

/// Asset location section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory that `/assets/...` sources resolve against
    pub root: PathBuf,
    /// Image shown when an item's own image fails to load
    pub fallback: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self { root: PathBuf::from("."), fallback: DEFAULT_FALLBACK_SOURCE.to_string() }
    }
}

/// Full `rvl.toml` configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RvlConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Collection overrides; the built-in catalog is used when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<CollectionPattern>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "collections.pixel_dogs.count")
    pub field: String,
    /// Error message
    pub message: String,
}

impl ConfigValidationError {
    fn new(field: impl Into<String>, message: &str) -> Self {
        Self { field: field.into(), message: message.to_string() }
    }
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rvl.toml: '{}' {}", self.field, self.message)
    }
}

impl RvlConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.layout.tile_size == 0 {
            errors.push(ConfigValidationError::new("layout.tile_size", "must be a positive integer"));
        }
        if self.layout.rows == 0 {
            errors.push(ConfigValidationError::new("layout.rows", "must be a positive integer"));
        }
        if self.layout.initial_columns == 0 {
            errors.push(ConfigValidationError::new("layout.initial_columns", "must be a positive integer"));
        }

        if self.animation.reveal_tick_ms == 0 {
            errors.push(ConfigValidationError::new("animation.reveal_tick_ms", "must be a positive integer"));
        }
        if self.animation.rotation_ms == 0 {
            errors.push(ConfigValidationError::new("animation.rotation_ms", "must be a positive integer"));
        }

        if self.assets.fallback.is_empty() {
            errors.push(ConfigValidationError::new("assets.fallback", "must be a non-empty string"));
        }

        let mut seen = HashSet::new();
        for pattern in &self.collections {
            if pattern.id.is_empty() {
                errors.push(ConfigValidationError::new("collections.id", "must be a non-empty string"));
                continue;
            }
            if !seen.insert(pattern.id.as_str()) {
                errors.push(ConfigValidationError::new(format!("collections.{}", pattern.id), "is defined more than once"));
            }
            if pattern.count == 0 {
                errors.push(ConfigValidationError::new(
                    format!("collections.{}.count", pattern.id),
                    "must be a positive integer",
                ));
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Per-grid settings derived from the layout, animation and assets sections.
    pub fn grid_settings(&self) -> GridSettings {
        GridSettings {
            layout: ColumnLayout {
                tile_size: self.layout.tile_size,
                gap: self.layout.gap,
                padding: self.layout.padding,
            },
            rows: self.layout.rows,
            initial_columns: self.layout.initial_columns,
            lit_count: self.animation.lit_count,
            rotation_ms: self.animation.rotation_ms,
            timing: RevealTiming {
                tick_ms: self.animation.reveal_tick_ms,
                hide_delay_ms: self.animation.hide_delay_ms,
            },
            fallback_source: self.assets.fallback.clone(),
        }
    }

    /// The configured catalog, or the built-in one when no collections are listed.
    pub fn catalog(&self) -> Catalog {
        if self.collections.is_empty() {
            Catalog::from_patterns(&default_patterns())
        } else {
            Catalog::from_patterns(&self.collections)
        }
    }
}
